//! Request building, envelope validation and record mapping for WMS resources.
//!
//! # Design
//! `ResourceFetcher` owns only a `Transport`. Every fetch receives the
//! `GlobalConfig` and the resource type's `ResourceState` explicitly, resets
//! that state's error log, performs one blocking GET and validates the
//! response. Failures are appended to the error log instead of being
//! returned, and a call that logged anything yields no records.
//!
//! Validation of a response is split out as `parse_response`, a pure
//! function over `HttpResponse`, so the envelope rules can be tested without
//! a network.
//!
//! `WmsClient` bundles a `Registry` with a fetcher for callers that do not
//! need to manage the states themselves.

use serde_json::{Map, Value};

use crate::config::GlobalConfig;
use crate::error::{ErrorLog, WmsError};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::query::Query;
use crate::record::ResourceRecord;
use crate::resource::Resource;
use crate::state::{LastResponse, Registry, ResourceState};

/// Outcome of validating one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// Parsed body, when it was JSON.
    pub json: Option<Value>,
    /// The `result_list` objects, or every failure detected.
    pub result: Result<Vec<Map<String, Value>>, Vec<WmsError>>,
}

/// Validate a WMS response and extract its `result_list`.
///
/// The status code and body-emptiness checks are both reported when they
/// fail, and stop validation; a non-empty body is still parsed so the JSON
/// stays available for inspection. After that, the first failing check among
/// JSON parsing, envelope `status`, `data`, `result_list` and its entries is
/// the only one reported.
pub fn parse_response(response: &HttpResponse) -> ParsedResponse {
    let mut errors = Vec::new();
    if response.status != 200 {
        errors.push(WmsError::ResponseCode(response.status));
    }
    if response.body.is_empty() {
        errors.push(WmsError::EmptyBody);
    }
    if !errors.is_empty() {
        let json = serde_json::from_str(&response.body).ok();
        return ParsedResponse { json, result: Err(errors) };
    }

    let json: Value = match serde_json::from_str(&response.body) {
        Ok(json) => json,
        Err(e) => {
            return ParsedResponse {
                json: None,
                result: Err(vec![WmsError::Json(e.to_string())]),
            }
        }
    };

    let result = extract_result_list(&json).map_err(|e| vec![e]);
    ParsedResponse { json: Some(json), result }
}

fn extract_result_list(json: &Value) -> Result<Vec<Map<String, Value>>, WmsError> {
    if json.get("status").and_then(Value::as_str) != Some("success") {
        return Err(WmsError::ServiceFailure(envelope_message(json)));
    }

    let data = json
        .get("data")
        .and_then(Value::as_object)
        .ok_or(WmsError::MissingData)?;

    let result_list = match data.get("result_list") {
        None | Some(Value::Null) => return Err(WmsError::MissingResultList),
        Some(list) => list.as_array().ok_or(WmsError::ResultListNotArray)?,
    };

    result_list
        .iter()
        .enumerate()
        .map(|(i, entry)| entry.as_object().cloned().ok_or(WmsError::RecordNotObject(i)))
        .collect()
}

fn envelope_message(json: &Value) -> String {
    match json.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
    }
}

/// Fetches WMS resources over a `Transport`.
#[derive(Debug, Clone, Default)]
pub struct ResourceFetcher<T = UreqTransport> {
    transport: T,
}

impl ResourceFetcher<UreqTransport> {
    pub fn new() -> Self {
        Self::with_transport(UreqTransport::new())
    }
}

impl<T: Transport> ResourceFetcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(
        &self,
        config: &GlobalConfig,
        state: &mut ResourceState,
        path: &str,
        query: Option<&Query>,
    ) -> HttpRequest {
        HttpRequest {
            url: state.request_url(config, path, query),
        }
    }

    /// Fetch every record under `path`.
    ///
    /// Returns an empty list when anything went wrong; check
    /// `state.errors()` after every call.
    ///
    /// The request goes to the service URL of `state`, while records are
    /// typed as `R`. Pass the state that belongs to `R`
    /// (`ResourceState::for_resource::<R>()` or `Registry::parts::<R>()`).
    #[tracing::instrument(level = "debug", skip(self, config, state, query), fields(resource = R::NAME))]
    pub fn fetch<R: Resource>(
        &self,
        config: &GlobalConfig,
        state: &mut ResourceState,
        path: &str,
        query: Option<&Query>,
    ) -> Vec<ResourceRecord<R>> {
        state.begin_call();
        let request = self.build_request(config, state, path, query);

        let response = match self.transport.get(&request) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "transport failure");
                state.errors_mut().push(e.into());
                return Vec::new();
            }
        };

        let parsed = parse_response(&response);
        state.record_response(LastResponse {
            response,
            json: parsed.json,
        });

        match parsed.result {
            Ok(entries) => {
                tracing::debug!(url = %request.url, count = entries.len(), "fetched records");
                entries.into_iter().map(ResourceRecord::new).collect()
            }
            Err(errors) => {
                for error in &errors {
                    tracing::warn!(url = %request.url, %error, "invalid service response");
                }
                state.errors_mut().extend(errors);
                Vec::new()
            }
        }
    }

    /// Fetch the first record under `path`, if any.
    pub fn fetch_first<R: Resource>(
        &self,
        config: &GlobalConfig,
        state: &mut ResourceState,
        path: &str,
        query: Option<&Query>,
    ) -> Option<ResourceRecord<R>> {
        self.fetch(config, state, path, query).into_iter().next()
    }
}

/// A `Registry` paired with a `ResourceFetcher`.
#[derive(Debug, Clone)]
pub struct WmsClient<T = UreqTransport> {
    registry: Registry,
    fetcher: ResourceFetcher<T>,
}

impl WmsClient<UreqTransport> {
    pub fn new(config: GlobalConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> WmsClient<T> {
    pub fn with_transport(config: GlobalConfig, transport: T) -> Self {
        Self {
            registry: Registry::new(config),
            fetcher: ResourceFetcher::with_transport(transport),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Fetch every `R` record under `path`.
    pub fn get<R: Resource>(&mut self, path: &str, query: Option<&Query>) -> Vec<ResourceRecord<R>> {
        let (config, state) = self.registry.parts::<R>();
        self.fetcher.fetch(config, state, path, query)
    }

    /// Fetch the first `R` record under `path`.
    pub fn first<R: Resource>(&mut self, path: &str, query: Option<&Query>) -> Option<ResourceRecord<R>> {
        let (config, state) = self.registry.parts::<R>();
        self.fetcher.fetch_first(config, state, path, query)
    }

    /// Errors recorded by the last fetch of `R`.
    pub fn errors<R: Resource>(&mut self) -> &ErrorLog {
        self.registry.state::<R>().errors()
    }

    pub fn last_response<R: Resource>(&mut self) -> Option<&LastResponse> {
        self.registry.state::<R>().last_response()
    }

    pub fn set_base_url<R: Resource>(&mut self, url: impl Into<String>) {
        self.registry.state::<R>().set_base_url(url);
    }

    pub fn service_url<R: Resource>(&mut self) -> String {
        let (config, state) = self.registry.parts::<R>();
        state.service_url(config).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::TransportError;
    use crate::resource;

    resource!(Biz);

    /// Answers every GET with the same canned result and remembers the URLs.
    struct Canned {
        reply: Result<HttpResponse, TransportError>,
        seen: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                }),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(TransportError(message.to_string())),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.url.clone());
            self.reply.clone()
        }
    }

    fn client(transport: Canned) -> WmsClient<Canned> {
        WmsClient::with_transport(GlobalConfig::new("http://foo.bar"), transport)
    }

    fn query() -> Query {
        Query::new().param("foo", 1).param("bar", "a")
    }

    fn messages(client: &mut WmsClient<Canned>) -> Vec<String> {
        client.errors::<Biz>().messages()
    }

    #[test]
    fn requests_path_and_query() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":[]}}"#));
        let records = client.get::<Biz>("bam/1/test", Some(&query()));

        assert!(records.is_empty());
        assert!(client.errors::<Biz>().is_empty());
        assert_eq!(
            client.fetcher.transport().seen.borrow().as_slice(),
            ["http://foo.bar/biz/bam/1/test?foo=1&bar=a"]
        );
    }

    #[test]
    fn non_200_status_is_reported() {
        let mut client = client(Canned::new(400, r#"{"status":"success"}"#));
        let records = client.get::<Biz>("bam/1/test", Some(&query()));

        assert!(records.is_empty());
        assert_eq!(messages(&mut client), ["ExternalServiceError: Response code 400"]);
    }

    #[test]
    fn non_200_status_hides_a_valid_envelope() {
        let mut client = client(Canned::new(500, r#"{"status":"success","data":{"result_list":[{}]}}"#));
        assert!(client.get::<Biz>("bam", None).is_empty());
        assert_eq!(messages(&mut client), ["ExternalServiceError: Response code 500"]);
    }

    #[test]
    fn status_and_empty_body_both_reported() {
        let mut client = client(Canned::new(503, ""));
        client.get::<Biz>("bam", None);
        assert_eq!(
            messages(&mut client),
            ["ExternalServiceError: Response code 503", "ExternalServiceError: Empty body response"]
        );
    }

    #[test]
    fn empty_body_is_reported() {
        let mut client = client(Canned::new(200, ""));
        client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(messages(&mut client), ["ExternalServiceError: Empty body response"]);
    }

    #[test]
    fn invalid_json_is_reported_verbatim() {
        let mut client = client(Canned::new(200, "not json"));
        client.get::<Biz>("bam", None);

        let errors = client.errors::<Biz>();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.first(), Some(WmsError::Json(_))));
        assert!(!errors.messages()[0].starts_with("ExternalServiceError"));
    }

    #[test]
    fn service_error_reports_envelope_message() {
        let mut client = client(Canned::new(200, r#"{"status":"error","message":"Test Error"}"#));
        client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(messages(&mut client), ["ExternalServiceError: Test Error"]);
    }

    #[test]
    fn missing_data_is_reported() {
        let mut client = client(Canned::new(200, r#"{"status":"success"}"#));
        client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(
            messages(&mut client),
            ["ExternalServiceError: Malformed WMS response object. Can not find :data key"]
        );
    }

    #[test]
    fn missing_result_list_is_reported() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{}}"#));
        client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(
            messages(&mut client),
            ["ExternalServiceError: Malformed WMS response object. Can not find :result_list key"]
        );
    }

    #[test]
    fn non_array_result_list_is_reported() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":""}}"#));
        client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(
            messages(&mut client),
            ["ExternalServiceError: Malformed WMS response object. :result_list is not an array"]
        );
    }

    #[test]
    fn non_object_entry_fails_the_whole_call() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":[{},3]}}"#));
        assert!(client.get::<Biz>("bam", None).is_empty());
        assert_eq!(
            client.errors::<Biz>().first(),
            Some(&WmsError::RecordNotObject(1))
        );
    }

    #[test]
    fn transport_failure_is_reported() {
        let mut client = client(Canned::failing("connection refused"));
        assert!(client.first::<Biz>("bam", None).is_none());
        assert_eq!(messages(&mut client), ["connection refused"]);
        assert!(client.last_response::<Biz>().is_none());
    }

    #[test]
    fn returns_every_record_by_default() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":[{},{},{}]}}"#));
        let records = client.get::<Biz>("bam/1/test", Some(&query()));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.resource_name() == "Biz"));
    }

    #[test]
    fn first_returns_the_first_record() {
        let mut client = client(Canned::new(
            200,
            r#"{"status":"success","data":{"result_list":[{"id":1},{"id":2}]}}"#,
        ));
        let record = client.first::<Biz>("bam/1/test", Some(&query())).unwrap();
        assert_eq!(record.get_i64("id"), Some(1));
        assert_eq!(record.resource_name(), "Biz");
    }

    #[test]
    fn first_returns_none_when_empty() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":[]}}"#));
        assert!(client.first::<Biz>("bam/1/test", Some(&query())).is_none());
        assert!(client.errors::<Biz>().is_empty());
    }

    #[test]
    fn errors_are_cleared_on_each_call() {
        let mut client = client(Canned::new(200, r#"{"status":"success","data":{"result_list":[]}}"#));
        client.registry_mut().state::<Biz>().errors_mut().push_message("stale");
        client.get::<Biz>("bam", None);
        assert!(client.errors::<Biz>().is_empty());
    }

    #[test]
    fn keeps_last_response_and_json() {
        let mut client = client(Canned::new(200, r#"{"status":"error","message":"nope"}"#));
        client.get::<Biz>("bam", None);

        let last = client.last_response::<Biz>().unwrap();
        assert_eq!(last.response.status, 200);
        assert_eq!(last.json.as_ref().and_then(|j| j["message"].as_str()), Some("nope"));
    }

    #[test]
    fn keeps_json_of_non_200_response() {
        let mut client = client(Canned::new(400, r#"{"status":"error","message":"bad param"}"#));
        assert!(client.get::<Biz>("x", None).is_empty());
        assert_eq!(messages(&mut client), ["ExternalServiceError: Response code 400"]);

        let last = client.last_response::<Biz>().unwrap();
        assert_eq!(last.response.status, 400);
        assert_eq!(last.json.as_ref().and_then(|j| j["message"].as_str()), Some("bad param"));
    }

    #[test]
    fn non_200_response_with_non_json_body_keeps_no_json() {
        let mut client = client(Canned::new(502, "<html>Bad Gateway</html>"));
        client.get::<Biz>("x", None);
        assert_eq!(messages(&mut client), ["ExternalServiceError: Response code 502"]);
        assert!(client.last_response::<Biz>().unwrap().json.is_none());
    }

    #[test]
    fn state_of_another_type_is_used_as_given() {
        let fetcher = ResourceFetcher::with_transport(Canned::new(
            200,
            r#"{"status":"success","data":{"result_list":[{"id":1}]}}"#,
        ));
        let config = GlobalConfig::new("http://foo.bar");
        let mut state = ResourceState::new("Other");

        let records = fetcher.fetch::<Biz>(&config, &mut state, "x", None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resource_name(), "Biz");
        assert!(!state.has_errors());
        assert_eq!(fetcher.transport().seen.borrow().as_slice(), ["http://foo.bar/other/x"]);
    }

    #[test]
    fn fetcher_works_on_an_explicit_state() {
        let fetcher = ResourceFetcher::with_transport(Canned::new(
            200,
            r#"{"status":"success","data":{"result_list":[{"name":"acme"}]}}"#,
        ));
        let config = GlobalConfig::new("http://foo.bar");
        let mut state = ResourceState::for_resource::<Biz>();
        state.set_base_url("http://baz.bar");

        let records = fetcher.fetch::<Biz>(&config, &mut state, "brand", None);
        assert_eq!(records[0].get_str("name"), Some("acme"));
        assert_eq!(fetcher.transport().seen.borrow().as_slice(), ["http://baz.bar/biz/brand"]);
    }

    #[test]
    fn envelope_message_variants() {
        assert_eq!(envelope_message(&serde_json::json!({"status": "error"})), "");
        assert_eq!(envelope_message(&serde_json::json!({"message": 42})), "42");
        assert_eq!(envelope_message(&serde_json::json!(["not", "an", "object"])), "");
    }

    #[test]
    fn data_that_is_not_an_object_counts_as_missing() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"status":"success","data":[]}"#.to_string(),
        };
        assert_eq!(parse_response(&response).result, Err(vec![WmsError::MissingData]));
    }

    #[test]
    fn null_result_list_counts_as_missing() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"status":"success","data":{"result_list":null}}"#.to_string(),
        };
        assert_eq!(parse_response(&response).result, Err(vec![WmsError::MissingResultList]));
    }
}
