use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{NewPost, Post, PostStore};
use crate::clock::Clock;

#[derive(Default)]
struct Board {
    posts: Vec<Post>,
    next_id: u64,
}

/// Session-only post storage. Ids run `mock-1`, `mock-2`, ...
pub struct MemoryPostStore {
    clock: Arc<dyn Clock>,
    board: Mutex<Board>,
}

impl MemoryPostStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            board: Mutex::new(Board::default()),
        }
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn add(&self, post: &NewPost) -> bool {
        let mut board = self.board.lock().unwrap_or_else(|e| e.into_inner());
        board.next_id += 1;
        let post = Post {
            id: format!("mock-{}", board.next_id),
            title: post.title.clone(),
            body: post.body.clone(),
            kind: post.kind,
            contact: post.contact.clone(),
            timestamp: self.clock.now(),
        };
        board.posts.push(post);
        true
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let board = self.board.lock().unwrap_or_else(|e| e.into_inner());
        Ok(board.posts.iter().rev().take(limit).cloned().collect())
    }
}
