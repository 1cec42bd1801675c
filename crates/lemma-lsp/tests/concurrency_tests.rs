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

//! Concurrency tests for lemma-lsp.
//!
//! The scheduler runs on its own thread while producers submit from others:
//!
//! 1. **Request Queue** - FIFO order and interrupts under concurrent producers
//! 2. **Scheduler Thread** - Every request answered while checking runs
//! 3. **Shutdown** - The thread stops and retires what is still pending

use lemma_lsp::reply::Replies;
use lemma_lsp::{
    request_queue, Incoming, Notification, Outgoing, Request, RequestId, Scheduler, ServerConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tower_lsp::jsonrpc::ErrorCode;
use tower_lsp::lsp_types::{Position, Url};

// ============================================================================
// TEST HELPERS
// ============================================================================

/// A document with `sentences` one-line definitions.
fn long_document(sentences: usize) -> String {
    (0..sentences).map(|i| format!("Definition d{}.\n", i)).collect()
}

fn uri(n: usize) -> Url {
    Url::parse(&format!("file:///concurrent{}.v", n)).unwrap()
}

fn collect_responses(
    outgoing: &mut tokio::sync::mpsc::UnboundedReceiver<Outgoing>,
) -> HashMap<RequestId, Result<(), ErrorCode>> {
    let mut responses = HashMap::new();
    while let Ok(message) = outgoing.try_recv() {
        if let Outgoing::Response { id, result } = message {
            let previous = responses.insert(id, result.map(|_| ()).map_err(|e| e.code));
            assert!(previous.is_none(), "second reply for {}", id);
        }
    }
    responses
}

// ============================================================================
// REQUEST QUEUE
// ============================================================================

#[test]
fn test_concurrent_producers_keep_per_producer_order() {
    let (queue, mut receiver) = request_queue();
    let producers: Vec<_> = (0..4u64)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for n in 0..250u64 {
                    queue.submit(Incoming::Cancel(RequestId(p * 1000 + n))).unwrap();
                }
            })
        })
        .collect();
    drop(queue);
    for producer in producers {
        producer.join().unwrap();
    }

    let mut last: HashMap<u64, u64> = HashMap::new();
    let mut total = 0;
    while let Some(message) = receiver.wait() {
        let Incoming::Cancel(RequestId(id)) = message else {
            panic!("unexpected message");
        };
        let (producer, n) = (id / 1000, id % 1000);
        if let Some(previous) = last.insert(producer, n) {
            assert!(n > previous, "producer {} out of order", producer);
        }
        total += 1;
    }
    assert_eq!(total, 1000);
}

#[test]
fn test_submit_from_other_thread_raises_interrupt() {
    let (queue, mut receiver) = request_queue();
    assert!(matches!(receiver.try_pop(), lemma_lsp::queue::Popped::Empty));

    thread::spawn(move || queue.submit(Incoming::Shutdown).unwrap())
        .join()
        .unwrap();
    assert!(receiver.interrupt().is_raised());
}

// ============================================================================
// SCHEDULER THREAD
// ============================================================================

#[test]
fn test_requests_answered_while_checking() {
    let (queue, receiver) = request_queue();
    let (replies, mut outgoing) = Replies::channel();
    let config = ServerConfig {
        sentences_per_increment: 2,
        ..ServerConfig::default()
    };
    let worker = Scheduler::new(receiver, replies, config).spawn().unwrap();

    for n in 0..3 {
        queue
            .submit(Incoming::Notification(Notification::DidOpen {
                uri: uri(n),
                version: 1,
                text: long_document(200),
            }))
            .unwrap();
    }

    let next_id = Arc::new(AtomicU64::new(0));
    let producers: Vec<_> = (0..3)
        .map(|n| {
            let queue = queue.clone();
            let next_id = Arc::clone(&next_id);
            thread::spawn(move || {
                let mut ids = Vec::new();
                for line in (0..200).step_by(10) {
                    let id = RequestId(next_id.fetch_add(1, Ordering::Relaxed));
                    queue
                        .submit(Incoming::Request {
                            id,
                            request: Request::Goals {
                                uri: uri(n),
                                position: Position::new(line, 0),
                            },
                        })
                        .unwrap();
                    ids.push(id);
                    thread::sleep(Duration::from_micros(50));
                }
                ids
            })
        })
        .collect();

    let issued: Vec<RequestId> = producers
        .into_iter()
        .flat_map(|producer| producer.join().unwrap())
        .collect();
    drop(queue);
    worker.join().unwrap();

    let responses = collect_responses(&mut outgoing);
    assert_eq!(responses.len(), issued.len());
    for id in issued {
        match responses.get(&id) {
            // Answered, or superseded by an earlier position on the same document.
            Some(Ok(())) | Some(Err(ErrorCode::ContentModified)) => {}
            other => panic!("unexpected reply for {}: {:?}", id, other),
        }
    }
}

#[test]
fn test_shutdown_stops_thread_and_retires_pending() {
    let (queue, receiver) = request_queue();
    let (replies, mut outgoing) = Replies::channel();
    let worker = Scheduler::new(receiver, replies, ServerConfig::default())
        .spawn()
        .unwrap();

    queue
        .submit(Incoming::Notification(Notification::DidOpen {
            uri: uri(0),
            version: 1,
            text: "Qed.\nCheck nat.\n".to_string(),
        }))
        .unwrap();
    queue
        .submit(Incoming::Request {
            id: RequestId(1),
            request: Request::DocumentSymbol { uri: uri(0) },
        })
        .unwrap();
    thread::sleep(Duration::from_millis(20));
    queue.submit(Incoming::Shutdown).unwrap();
    worker.join().unwrap();

    let responses = collect_responses(&mut outgoing);
    assert_eq!(responses.get(&RequestId(1)), Some(&Err(ErrorCode::RequestCancelled)));
    assert!(queue.is_closed());
}
