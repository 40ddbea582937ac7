//! Scripted remote executor for domain and HTTP tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::RemoteOperation;
use crate::domain::ports::{RemoteCallError, RemoteCallExecutor};

/// One call observed by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: RemoteOperation,
    pub variables: Value,
}

/// Executor that replays canned results in order and records every call.
///
/// Running out of script yields an `Unexpected` error naming the operation.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<Value, RemoteCallError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new(script: impl IntoIterator<Item = Result<Value, RemoteCallError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(_) => panic!("calls mutex"),
        }
    }

    pub fn operations(&self) -> Vec<RemoteOperation> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl RemoteCallExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        operation: RemoteOperation,
        variables: Value,
    ) -> Result<Value, RemoteCallError> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(RecordedCall {
                operation,
                variables,
            }),
            Err(_) => panic!("calls mutex"),
        }
        let next = match self.script.lock() {
            Ok(mut script) => script.pop_front(),
            Err(_) => panic!("script mutex"),
        };
        next.unwrap_or_else(|| {
            Err(RemoteCallError::unexpected(format!(
                "no scripted response for {operation}"
            )))
        })
    }
}
