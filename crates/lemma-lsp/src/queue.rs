// Dweve Lemma - Incremental Proof Checking
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The request queue between the transport and the scheduler.
//!
//! The queue is an unbounded FIFO of [`Incoming`] messages. Every successful
//! submit raises the shared [`Interrupt`] so that a checking increment in
//! progress yields at its next sentence boundary. The scheduler clears the
//! flag before it looks at the queue, never after, so a message submitted
//! between the look and the next increment still interrupts that increment.

use crate::error::ServerError;
use crate::message::{Incoming, RequestId};
use lemma_core::Interrupt;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<Incoming>,
    interrupt: Interrupt,
}

/// Consumer side of the queue, owned by the scheduler.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<Incoming>,
    interrupt: Interrupt,
}

/// Result of a non-blocking pop.
#[derive(Debug, PartialEq)]
pub enum Popped {
    Message(Incoming),
    Empty,
    /// Every sender is gone and the queue is drained.
    Closed,
}

/// Create a connected queue sharing one interrupt flag.
pub fn request_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let interrupt = Interrupt::new();
    (
        QueueSender {
            tx,
            interrupt: interrupt.clone(),
        },
        QueueReceiver { rx, interrupt },
    )
}

impl QueueSender {
    /// Append a message and interrupt any running increment.
    pub fn submit(&self, message: Incoming) -> Result<(), ServerError> {
        self.tx.send(message).map_err(|_| ServerError::QueueClosed)?;
        self.interrupt.raise();
        Ok(())
    }

    /// Ask the scheduler to cancel a request, if it is still waiting.
    pub fn cancel(&self, id: RequestId) -> Result<(), ServerError> {
        self.submit(Incoming::Cancel(id))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl QueueReceiver {
    /// The interrupt raised by every submit.
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Pop the oldest message without blocking.
    ///
    /// Clears the interrupt first: anything submitted after this call raises
    /// it again.
    pub fn try_pop(&mut self) -> Popped {
        self.interrupt.clear();
        match self.rx.try_recv() {
            Ok(message) => Popped::Message(message),
            Err(TryRecvError::Empty) => Popped::Empty,
            Err(TryRecvError::Disconnected) => Popped::Closed,
        }
    }

    /// Block the current thread until a message arrives. `None` once the
    /// queue is closed and drained.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(&mut self) -> Option<Incoming> {
        let message = self.rx.blocking_recv();
        self.interrupt.clear();
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = request_queue();
        tx.submit(Incoming::Cancel(RequestId(1))).unwrap();
        tx.cancel(RequestId(2)).unwrap();

        assert_eq!(rx.try_pop(), Popped::Message(Incoming::Cancel(RequestId(1))));
        assert_eq!(rx.try_pop(), Popped::Message(Incoming::Cancel(RequestId(2))));
        assert_eq!(rx.try_pop(), Popped::Empty);
    }

    #[test]
    fn test_submit_raises_interrupt() {
        let (tx, mut rx) = request_queue();
        assert!(!rx.interrupt().is_raised());

        tx.submit(Incoming::Shutdown).unwrap();
        assert!(rx.interrupt().is_raised());

        rx.try_pop();
        assert!(!rx.interrupt().is_raised());
    }

    #[test]
    fn test_closed_after_senders_drop() {
        let (tx, mut rx) = request_queue();
        tx.submit(Incoming::Shutdown).unwrap();
        drop(tx);

        assert_eq!(rx.try_pop(), Popped::Message(Incoming::Shutdown));
        assert_eq!(rx.try_pop(), Popped::Closed);
        assert_eq!(rx.wait(), None);
    }

    #[test]
    fn test_submit_fails_when_receiver_gone() {
        let (tx, rx) = request_queue();
        drop(rx);
        assert!(matches!(
            tx.submit(Incoming::Shutdown),
            Err(ServerError::QueueClosed)
        ));
        assert!(tx.is_closed());
    }

    #[test]
    fn test_wait_receives_from_other_thread() {
        let (tx, mut rx) = request_queue();
        let producer = thread::spawn(move || {
            for id in 0..100 {
                tx.submit(Incoming::Cancel(RequestId(id))).unwrap();
            }
        });

        let mut received = Vec::new();
        while let Some(message) = rx.wait() {
            received.push(message);
        }
        producer.join().unwrap();

        let expected: Vec<_> = (0..100).map(|id| Incoming::Cancel(RequestId(id))).collect();
        assert_eq!(received, expected);
    }
}
