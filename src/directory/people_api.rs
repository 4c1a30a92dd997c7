use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use super::api::{DirectoryApi, GroupPage, PeoplePage};
use crate::error::{BackupError, BackupResult};
use crate::model::{ContactGroup, Person, Token, PERSON_FIELDS};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const BODY_EXCERPT: usize = 500;

/// The People API over HTTPS, signed with a bearer token.
pub struct PeopleApi {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl PeopleApi {
    pub fn new(base_url: &str, token: &Token) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: token.authorization_header(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> ureq::Request {
        self.agent
            .get(&self.url(path))
            .set("Authorization", &self.authorization)
    }

    fn post(&self, path: &str) -> ureq::Request {
        self.agent
            .post(&self.url(path))
            .set("Authorization", &self.authorization)
    }

    fn read_json<T: DeserializeOwned>(response: ureq::Response, operation: &str) -> BackupResult<T> {
        response.into_json().map_err(|e| BackupError::Transport {
            operation: operation.to_string(),
            message: format!("unreadable response: {}", e),
        })
    }
}

fn api_error(operation: &str) -> impl FnOnce(ureq::Error) -> BackupError + '_ {
    move |e| match e {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            BackupError::Api {
                operation: operation.to_string(),
                status,
                body: body.chars().take(BODY_EXCERPT).collect(),
            }
        }
        ureq::Error::Transport(t) => BackupError::Transport {
            operation: operation.to_string(),
            message: t.to_string(),
        },
    }
}

impl DirectoryApi for PeopleApi {
    fn list_people(&self, page_token: Option<&str>, page_size: usize) -> BackupResult<PeoplePage> {
        const OP: &str = "list contacts";
        let mut request = self
            .get("people/me/connections")
            .query("personFields", PERSON_FIELDS)
            .query("pageSize", &page_size.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let response = request.call().map_err(api_error(OP))?;
        Self::read_json(response, OP)
    }

    fn list_groups(&self, page_token: Option<&str>, page_size: usize) -> BackupResult<GroupPage> {
        const OP: &str = "list contact groups";
        let mut request = self
            .get("contactGroups")
            .query("pageSize", &page_size.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let response = request.call().map_err(api_error(OP))?;
        Self::read_json(response, OP)
    }

    fn batch_delete_people(&self, resource_names: &[String]) -> BackupResult<()> {
        self.post("people:batchDeleteContacts")
            .send_json(json!({ "resourceNames": resource_names }))
            .map_err(api_error("batch delete contacts"))?;
        Ok(())
    }

    fn delete_group(&self, resource_name: &str) -> BackupResult<()> {
        self.agent
            .delete(&self.url(resource_name))
            .set("Authorization", &self.authorization)
            .query("deleteContacts", "false")
            .call()
            .map_err(api_error("delete contact group"))?;
        Ok(())
    }

    fn create_group(&self, name: &str) -> BackupResult<ContactGroup> {
        const OP: &str = "create contact group";
        let response = self
            .post("contactGroups")
            .send_json(json!({ "contactGroup": { "name": name } }))
            .map_err(api_error(OP))?;
        Self::read_json(response, OP)
    }

    fn batch_create_people(&self, people: &[Person]) -> BackupResult<()> {
        let contacts: Vec<_> = people
            .iter()
            .map(|p| json!({ "contactPerson": p }))
            .collect();
        self.post("people:batchCreateContacts")
            .send_json(json!({
                "contacts": contacts,
                "readMask": "names",
                "sources": ["READ_SOURCE_TYPE_CONTACT"],
            }))
            .map_err(api_error("batch create contacts"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token {
            access_token: "abc".into(),
            token_type: String::new(),
            refresh_token: None,
            expiry: None,
        }
    }

    #[test]
    fn urls_are_rooted_at_v1() {
        let api = PeopleApi::new("https://people.example.test/", &token());
        assert_eq!(
            api.url("people/me/connections"),
            "https://people.example.test/v1/people/me/connections"
        );
        assert_eq!(
            api.url("contactGroups/abc123"),
            "https://people.example.test/v1/contactGroups/abc123"
        );
    }

    #[test]
    fn connections_page_parses_declared_total() {
        let page: PeoplePage = serde_json::from_str(
            r#"{"connections": [{"resourceName": "people/c1", "etag": "e"}],
                "nextPageToken": "p2", "totalPeople": 42, "totalItems": 42}"#,
        )
        .unwrap();
        assert_eq!(page.connections.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
        assert_eq!(page.total_people, 42);
    }

    #[test]
    fn empty_connections_page_has_no_cursor() {
        let page: PeoplePage = serde_json::from_str("{}").unwrap();
        assert!(page.connections.is_empty());
        assert!(page.next_page_token.is_none());
        assert_eq!(page.total_people, 0);
    }

    #[test]
    fn unreachable_service_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let api = PeopleApi::new(&format!("http://127.0.0.1:{}", port), &token());
        let err = api.list_groups(None, 10).unwrap_err();
        assert!(matches!(err, BackupError::Transport { .. }));
        assert!(err.to_string().starts_with("list contact groups failed"));
    }
}
