//! In-memory transport for unit tests.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use mcid_core::RequestError;
use serde_json::Value;

use crate::traits::{HttpResponse, HttpTransport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sent {
    Json { url: String, body: Value },
    Form { url: String, form: Vec<(String, String)> },
    Bearer { url: String, token: String },
}

impl Sent {
    pub(crate) fn url(&self) -> &str {
        match self {
            Sent::Json { url, .. } | Sent::Form { url, .. } | Sent::Bearer { url, .. } => url,
        }
    }
}

/// Answers each URL with a fixed response (or a transport failure)
/// and records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: HashMap<String, Result<HttpResponse, String>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, url: &str, status: u16, body: Value) -> Self {
        self.routes
            .insert(url.to_owned(), Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    pub(crate) fn respond_raw(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes
            .insert(url.to_owned(), Ok(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn fail(mut self, url: &str, message: &str) -> Self {
        self.routes.insert(url.to_owned(), Err(message.to_owned()));
        self
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.sent().iter().map(|n| n.url().to_owned()).collect()
    }

    fn answer(&self, request: Sent) -> Result<HttpResponse, RequestError> {
        let route = self.routes.get(request.url()).cloned();
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        match route {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(RequestError::other(message)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, RequestError> {
        self.answer(Sent::Json {
            url: url.to_owned(),
            body: body.clone(),
        })
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, RequestError> {
        self.answer(Sent::Form {
            url: url.to_owned(),
            form: form
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        })
    }

    async fn get_bearer(&self, url: &str, token: &str) -> Result<HttpResponse, RequestError> {
        self.answer(Sent::Bearer {
            url: url.to_owned(),
            token: token.to_owned(),
        })
    }
}
