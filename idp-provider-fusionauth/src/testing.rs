//! In-memory `IdentityProviderApi` for tests

use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ClientError, ClientResult, IdentityProviderApi};

/// A call received by [`RecordingClient`]; bodies are kept as text
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(String),
    Read(String),
    Update(String, String),
    Delete(String),
}

/// Records every call and answers each one with the same canned reply
pub(crate) struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    reply: Result<String, (u16, String)>,
}

impl RecordingClient {
    pub(crate) fn responding(body: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Ok(body.to_string()),
        }
    }

    pub(crate) fn failing(status: u16, body: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Err((status, body.to_string())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> ClientResult<Vec<u8>> {
        self.calls.lock().unwrap().push(call);
        match &self.reply {
            Ok(body) => Ok(body.as_bytes().to_vec()),
            Err((status, body)) => Err(ClientError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

#[async_trait]
impl IdentityProviderApi for RecordingClient {
    async fn create_identity_provider(&self, body: Vec<u8>) -> ClientResult<Vec<u8>> {
        self.record(Call::Create(String::from_utf8_lossy(&body).into_owned()))
    }

    async fn read_identity_provider(&self, id: &str) -> ClientResult<Vec<u8>> {
        self.record(Call::Read(id.to_string()))
    }

    async fn update_identity_provider(&self, body: Vec<u8>, id: &str) -> ClientResult<Vec<u8>> {
        self.record(Call::Update(
            String::from_utf8_lossy(&body).into_owned(),
            id.to_string(),
        ))
    }

    async fn delete_identity_provider(&self, id: &str) -> ClientResult<()> {
        self.record(Call::Delete(id.to_string())).map(|_| ())
    }
}
