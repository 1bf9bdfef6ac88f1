//! Firestore REST client.

use super::config::ProviderConfig;
use super::value::{decode_document, document_id, encode_fields};
use crate::error::{ProviderError, ProviderResult};
use crate::providers::ProfileStore;
use crate::types::{
    Identity, Member, MemberId, NewRegistration, Registration, RegistrationId, SessionId,
    TrainingSession,
};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::watch;

/// Member profiles, keyed by uid.
pub const USERS: &str = "users";
/// Training sessions.
pub const SESSIONS: &str = "sessions";
/// Session registrations.
pub const REGISTRATIONS: &str = "registrations";

const PAGE_SIZE: u32 = 300;

/// Profile Store backed by Cloud Firestore.
///
/// Requests carry the current identity's ID token, read from the portal's
/// identity channel at call time.
#[derive(Clone)]
pub struct FirestoreProfileStore {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
    identity: watch::Receiver<Option<Identity>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    documents: Vec<Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<Value>,
}

impl FirestoreProfileStore {
    /// Create a store sharing `client`.
    #[must_use]
    pub const fn new(
        client: reqwest::Client,
        config: Arc<ProviderConfig>,
        identity: watch::Receiver<Option<Identity>>,
    ) -> Self {
        Self {
            client,
            config,
            identity,
        }
    }

    fn bearer(&self) -> ProviderResult<String> {
        self.identity
            .borrow()
            .as_ref()
            .map(|identity| identity.id_token.clone())
            .ok_or(ProviderError::Unauthenticated)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.documents_url())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        collection: &'static str,
        id: &str,
    ) -> ProviderResult<Value> {
        let token = self.bearer()?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::Rejected(format!("unexpected response: {e}"))),
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound {
                collection,
                id: id.to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthenticated),
            status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Unavailable(format!("{status}: {body}")))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(collection, %status, "firestore rejected request");
                Err(ProviderError::Rejected(error_message(&body).unwrap_or_else(|| status.to_string())))
            }
        }
    }

    async fn list<T: DeserializeOwned>(&self, collection: &'static str) -> ProviderResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url(collection))
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListPage = serde_json::from_value(self.send(request, collection, "").await?)
                .map_err(|e| ProviderError::Rejected(format!("unexpected list page: {e}")))?;
            for document in &page.documents {
                items.push(decode_document(document)?);
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(collection, count = items.len(), "listed documents");
        Ok(items)
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn member_fields(member: &Member) -> ProviderResult<Value> {
    let mut fields = encode_fields(member, &["joinDate"])?;
    if let Value::Object(map) = &mut fields {
        map.remove("id");
    }
    Ok(fields)
}

fn registrations_query(session: &SessionId) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": REGISTRATIONS }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "sessionId" },
                    "op": "EQUAL",
                    "value": { "stringValue": session.as_str() }
                }
            }
        }
    })
}

impl ProfileStore for FirestoreProfileStore {
    async fn get_member(&self, id: &MemberId) -> ProviderResult<Member> {
        let request = self.client.get(self.url(&format!("{USERS}/{id}")));
        let document = self.send(request, USERS, id.as_str()).await?;
        decode_document(&document)
    }

    async fn put_member(&self, member: &Member) -> ProviderResult<()> {
        let fields = member_fields(member)?;
        let request = self
            .client
            .patch(self.url(&format!("{USERS}/{}", member.id)))
            .json(&json!({ "fields": fields }));
        self.send(request, USERS, member.id.as_str()).await?;
        tracing::debug!(uid = %member.id, "stored member profile");
        Ok(())
    }

    async fn list_members(&self) -> ProviderResult<Vec<Member>> {
        self.list(USERS).await
    }

    async fn list_sessions(&self) -> ProviderResult<Vec<TrainingSession>> {
        self.list(SESSIONS).await
    }

    async fn create_registration(
        &self,
        registration: NewRegistration,
    ) -> ProviderResult<Registration> {
        let fields = encode_fields(&registration, &["registeredAt"])?;
        let request = self
            .client
            .post(self.url(REGISTRATIONS))
            .json(&json!({ "fields": fields }));
        let document = self.send(request, REGISTRATIONS, "").await?;

        let id = document
            .get("name")
            .and_then(Value::as_str)
            .map(document_id)
            .ok_or_else(|| ProviderError::Rejected("created document has no name".into()))?;
        Ok(Registration::stored(RegistrationId::new(id), registration))
    }

    async fn list_registrations(
        &self,
        session: Option<&SessionId>,
    ) -> ProviderResult<Vec<Registration>> {
        let Some(session) = session else {
            return self.list(REGISTRATIONS).await;
        };

        let request = self
            .client
            .post(format!("{}:runQuery", self.config.documents_url()))
            .json(&registrations_query(session));
        let rows: Vec<QueryRow> =
            serde_json::from_value(self.send(request, REGISTRATIONS, session.as_str()).await?)
                .map_err(|e| ProviderError::Rejected(format!("unexpected query result: {e}")))?;

        rows.iter()
            .filter_map(|row| row.document.as_ref())
            .map(decode_document)
            .collect()
    }
}
