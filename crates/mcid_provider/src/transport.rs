use std::sync::Arc;

use async_trait::async_trait;
use mcid_core::RequestError;
use reqwest::header::ACCEPT;

use crate::traits::{HttpResponse, HttpTransport};

const JSON: &str = "application/json";

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, RequestError> {
        let response = self
            .post(url)
            .header(ACCEPT, JSON)
            .json(body)
            .send()
            .await?;
        read_response(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, RequestError> {
        let response = self
            .post(url)
            .header(ACCEPT, JSON)
            .form(form)
            .send()
            .await?;
        read_response(response).await
    }

    async fn get_bearer(&self, url: &str, token: &str) -> Result<HttpResponse, RequestError> {
        let response = self
            .get(url)
            .header(ACCEPT, JSON)
            .bearer_auth(token)
            .send()
            .await?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse, RequestError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(HttpResponse { status, body })
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, RequestError> {
        (**self).post_json(url, body).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, RequestError> {
        (**self).post_form(url, form).await
    }

    async fn get_bearer(&self, url: &str, token: &str) -> Result<HttpResponse, RequestError> {
        (**self).get_bearer(url, token).await
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, RequestError> {
        (**self).post_json(url, body).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, RequestError> {
        (**self).post_form(url, form).await
    }

    async fn get_bearer(&self, url: &str, token: &str) -> Result<HttpResponse, RequestError> {
        (**self).get_bearer(url, token).await
    }
}
