//! Collection synchronizer: the locally mirrored page of user records.
//!
//! # Design
//! `CollectionView` is owned by a `watch` channel and only ever changed by
//! `reduce`. Network operations dispatch `Pending`, await the adapter, then
//! dispatch the settled outcome. Create and update never touch `items`; the
//! caller re-fetches. Delete is the one operation that patches the list in
//! place. Search is a read-time filter over the fetched page only.
//!
//! Fetches carry a ticket from a per-kind `Sequencer`. Under
//! `FetchOrdering::LatestIssued` a result whose ticket was superseded while
//! it was in flight is dropped.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adapter::ApiAdapter;
use crate::error::ApiError;
use crate::outcome::{FetchOrdering, Outcome, Sequencer};
use crate::types::{CreatedUser, NewUser, UpdatedUser, UserPage, UserPatch, UserRecord};
use crate::validation::{UserForm, ValidationErrors};

pub const FETCH_USERS_FAILED: &str = "Failed to fetch users";
pub const FETCH_USER_FAILED: &str = "Failed to fetch user";
pub const CREATE_USER_FAILED: &str = "Failed to create user";
pub const UPDATE_USER_FAILED: &str = "Failed to update user";
pub const DELETE_USER_FAILED: &str = "Failed to delete user";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    Table,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionView {
    pub items: Vec<UserRecord>,
    /// Last record fetched by id.
    pub current: Option<UserRecord>,
    pub pagination: Pagination,
    pub search_query: String,
    pub view_mode: ViewMode,
    pub loading: bool,
    pub error: Option<String>,
}

impl CollectionView {
    /// Items matching `search_query`, in page order. An empty query shows
    /// everything.
    pub fn visible(&self) -> Vec<&UserRecord> {
        let needle = self.search_query.to_lowercase();
        self.items
            .iter()
            .filter(|user| needle.is_empty() || user.matches(&needle))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsersAction {
    FetchPage(Outcome<UserPage>),
    FetchRecord(Outcome<UserRecord>),
    Create(Outcome<CreatedUser>),
    Update(Outcome<UpdatedUser>),
    /// `Ok` carries the deleted id.
    Delete(Outcome<u64>),
    SetSearchQuery(String),
    SetViewMode(ViewMode),
    SetPagination { page: u32, per_page: u32 },
    ClearError,
}

fn settle<T>(state: &mut CollectionView, outcome: Outcome<T>) -> Option<T> {
    match outcome {
        Outcome::Pending => {
            state.loading = true;
            state.error = None;
            None
        }
        Outcome::Ok(value) => {
            state.loading = false;
            state.error = None;
            Some(value)
        }
        Outcome::Err(message) => {
            state.loading = false;
            state.error = Some(message);
            None
        }
    }
}

pub fn reduce(state: &mut CollectionView, action: UsersAction) {
    match action {
        UsersAction::FetchPage(outcome) => {
            if let Some(page) = settle(state, outcome) {
                state.pagination = Pagination {
                    page: page.page,
                    per_page: page.per_page,
                    total: page.total,
                    total_pages: page.total_pages,
                };
                state.items = page.data;
            }
        }
        UsersAction::FetchRecord(outcome) => {
            if let Some(user) = settle(state, outcome) {
                state.current = Some(user);
            }
        }
        UsersAction::Create(outcome) => {
            settle(state, outcome);
        }
        UsersAction::Update(outcome) => {
            settle(state, outcome);
        }
        UsersAction::Delete(outcome) => {
            if let Some(id) = settle(state, outcome) {
                state.items.retain(|user| user.id != id);
            }
        }
        UsersAction::SetSearchQuery(query) => state.search_query = query,
        UsersAction::SetViewMode(mode) => state.view_mode = mode,
        UsersAction::SetPagination { page, per_page } => {
            state.pagination.page = page;
            state.pagination.per_page = per_page;
        }
        UsersAction::ClearError => state.error = None,
    }
}

pub struct UserCollection {
    adapter: Arc<ApiAdapter>,
    state: watch::Sender<CollectionView>,
    ordering: FetchOrdering,
    page_seq: Sequencer,
    record_seq: Sequencer,
}

impl UserCollection {
    pub fn new(adapter: Arc<ApiAdapter>, ordering: FetchOrdering) -> Self {
        let (state, _) = watch::channel(CollectionView::default());
        Self {
            adapter,
            state,
            ordering,
            page_seq: Sequencer::new(),
            record_seq: Sequencer::new(),
        }
    }

    fn dispatch(&self, action: UsersAction) {
        self.state.send_modify(|state| reduce(state, action));
    }

    pub fn state(&self) -> CollectionView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionView> {
        self.state.subscribe()
    }

    /// Filtered view of the current page.
    pub fn visible(&self) -> Vec<UserRecord> {
        self.state.borrow().visible().into_iter().cloned().collect()
    }

    /// Load one page. Pagination comes from the response; `per_page` is
    /// only a request.
    pub async fn fetch_page(&self, page: u32, per_page: u32) -> Outcome<UserPage> {
        let ticket = self.page_seq.issue();
        self.dispatch(UsersAction::FetchPage(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let response = self
                .adapter
                .execute(client.build_list_users(page, per_page))
                .await?;
            client.parse_list_users(response)
        }
        .await;
        let outcome = self.finish(result, FETCH_USERS_FAILED);

        if self.page_seq.accepts(self.ordering, ticket) {
            debug!(page, per_page, ticket, "applying page");
            self.dispatch(UsersAction::FetchPage(outcome.clone()));
        } else {
            debug!(page, ticket, "discarding superseded page");
        }
        outcome
    }

    pub async fn fetch_record(&self, id: u64) -> Outcome<UserRecord> {
        let ticket = self.record_seq.issue();
        self.dispatch(UsersAction::FetchRecord(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let response = self.adapter.execute(client.build_get_user(id)).await?;
            client.parse_get_user(response)
        }
        .await;
        let outcome = self.finish(result, FETCH_USER_FAILED);

        if self.record_seq.accepts(self.ordering, ticket) {
            self.dispatch(UsersAction::FetchRecord(outcome.clone()));
        }
        outcome
    }

    /// Submit a new record. The local list is left stale until the next
    /// fetch.
    pub async fn create_record(&self, fields: &NewUser) -> Outcome<CreatedUser> {
        self.dispatch(UsersAction::Create(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let response = self
                .adapter
                .execute(client.build_create_user(fields)?)
                .await?;
            client.parse_create_user(response)
        }
        .await;
        let outcome = self.finish(result, CREATE_USER_FAILED);
        if let Outcome::Ok(created) = &outcome {
            info!(id = %created.id, "created user");
        }

        self.dispatch(UsersAction::Create(outcome.clone()));
        outcome
    }

    pub async fn update_record(&self, id: u64, fields: &UserPatch) -> Outcome<UpdatedUser> {
        self.dispatch(UsersAction::Update(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let response = self
                .adapter
                .execute(client.build_update_user(id, fields)?)
                .await?;
            client.parse_update_user(response)
        }
        .await;
        let outcome = self.finish(result, UPDATE_USER_FAILED);
        if outcome.is_ok() {
            info!(id, "updated user");
        }

        self.dispatch(UsersAction::Update(outcome.clone()));
        outcome
    }

    /// Delete remotely, then drop the matching entry from `items`.
    pub async fn delete_record(&self, id: u64) -> Outcome<u64> {
        self.dispatch(UsersAction::Delete(Outcome::Pending));

        let client = self.adapter.client();
        let result = async {
            let response = self.adapter.execute(client.build_delete_user(id)).await?;
            client.parse_delete_user(response)
        }
        .await
        .map(|()| id);
        let outcome = self.finish(result, DELETE_USER_FAILED);
        if outcome.is_ok() {
            info!(id, "deleted user");
        }

        self.dispatch(UsersAction::Delete(outcome.clone()));
        outcome
    }

    /// Validate a form and create (`editing == None`) or update the record.
    pub async fn submit_form(
        &self,
        editing: Option<u64>,
        form: &UserForm,
    ) -> Result<Outcome<()>, ValidationErrors> {
        form.validate()?;
        let payload = form.payload();
        let outcome = match editing {
            None => self.create_record(&payload).await.map(drop),
            Some(id) => self.update_record(id, &payload.into()).await.map(drop),
        };
        Ok(outcome)
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.dispatch(UsersAction::SetSearchQuery(query.into()));
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.dispatch(UsersAction::SetViewMode(mode));
    }

    /// Record the page the view wants; no request is issued.
    pub fn set_pagination(&self, page: u32, per_page: u32) {
        self.dispatch(UsersAction::SetPagination { page, per_page });
    }

    pub fn clear_error(&self) {
        self.dispatch(UsersAction::ClearError);
    }

    fn finish<T>(&self, result: Result<T, ApiError>, fallback: &str) -> Outcome<T> {
        if let Err(e) = &result {
            warn!(error = %e, "{fallback}");
        }
        Outcome::settle(result, fallback)
    }
}

impl std::fmt::Debug for UserCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCollection")
            .field("ordering", &self.ordering)
            .field("items", &self.state.borrow().items.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    use crate::client::DirectoryClient;
    use crate::credentials::{Credentials, TOKEN_KEY};
    use crate::http::HttpMethod;
    use crate::navigation::{Route, RouteWatch};
    use crate::testing::{response, ScriptedTransport};

    const BASE: &str = "https://reqres.in/api";

    struct Harness {
        users: UserCollection,
        transport: Arc<ScriptedTransport>,
        credentials: Credentials,
        routes: Arc<RouteWatch>,
    }

    fn harness_with(ordering: FetchOrdering) -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let credentials = Credentials::in_memory();
        credentials.persist("abc", false).unwrap();
        let routes = Arc::new(RouteWatch::default());
        let adapter = Arc::new(ApiAdapter::new(
            DirectoryClient::new(BASE),
            transport.clone(),
            credentials.clone(),
            routes.clone(),
        ));
        Harness {
            users: UserCollection::new(adapter, ordering),
            transport,
            credentials,
            routes,
        }
    }

    fn harness() -> Harness {
        harness_with(FetchOrdering::LatestIssued)
    }

    fn user(id: u64, first: &str, last: &str) -> UserRecord {
        UserRecord {
            id,
            email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
        }
    }

    fn page_json(page: u32, per_page: u32, total: u32, users: &[UserRecord]) -> String {
        serde_json::json!({
            "page": page,
            "per_page": per_page,
            "total": total,
            "total_pages": total.div_ceil(per_page),
            "data": users,
        })
        .to_string()
    }

    fn first_page() -> Vec<UserRecord> {
        vec![user(1, "George", "Bluth"), user(2, "Janet", "Weaver")]
    }

    /// Poll `fut` once so it issues its request, then leave it parked.
    async fn start<F: Future>(fut: &mut Pin<Box<F>>) {
        tokio::select! {
            biased;
            _ = fut.as_mut() => panic!("request finished before its gate opened"),
            _ = tokio::task::yield_now() => {}
        }
    }

    #[tokio::test]
    async fn fetch_page_replaces_items_and_pagination() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));

        let outcome = h.users.fetch_page(1, 2).await;

        assert!(outcome.is_ok());
        let state = h.users.state();
        assert_eq!(
            state.pagination,
            Pagination {
                page: 1,
                per_page: 2,
                total: 4,
                total_pages: 2
            }
        );
        assert_eq!(state.items, first_page());
        assert!(!state.loading);
        assert_eq!(state.error, None);

        let sent = h.transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].path, format!("{BASE}/users?page=1&per_page=2"));
        assert_eq!(sent[0].header("authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn pagination_comes_from_response_not_request() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 6, 12, &first_page()));

        h.users.fetch_page(1, 50).await;

        let state = h.users.state();
        assert_eq!(state.pagination.per_page, 6);
        assert_eq!(state.pagination.total_pages, 2);
        assert!(state.items.len() as u32 <= state.pagination.per_page);
    }

    #[tokio::test]
    async fn failed_fetch_preserves_items() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(500, "{}");

        let outcome = h.users.fetch_page(2, 2).await;

        assert_eq!(outcome.error(), Some(FETCH_USERS_FAILED));
        let state = h.users.state();
        assert_eq!(state.items, first_page());
        assert_eq!(state.pagination.page, 1);
        assert_eq!(state.error.as_deref(), Some(FETCH_USERS_FAILED));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn unauthorized_fetch_signs_out() {
        let h = harness();
        h.transport.respond(401, r#"{"error":"Missing API key"}"#);

        h.users.fetch_page(1, 5).await;

        assert_eq!(h.credentials.token(), None);
        assert_eq!(h.routes.current(), Route::Login);
        assert_eq!(h.users.state().error.as_deref(), Some("Missing API key"));
    }

    #[tokio::test]
    async fn create_leaves_items_untouched() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(
            201,
            r#"{"name":"Jane Doe","job":"jane@x.com","id":"731","createdAt":"2024-01-01T00:00:00.000Z"}"#,
        );

        let outcome = h
            .users
            .create_record(&NewUser {
                name: "Jane Doe".to_string(),
                job: "jane@x.com".to_string(),
            })
            .await;

        assert_eq!(outcome.ok().map(|c| c.id), Some("731".to_string()));
        assert_eq!(h.users.state().items, first_page());
        let sent = &h.transport.requests()[1];
        assert_eq!(sent.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Jane Doe", "job": "jane@x.com"}));
    }

    #[tokio::test]
    async fn update_leaves_items_untouched() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport
            .respond(200, r#"{"name":"Georgie Bluth","updatedAt":"2024-01-01T00:00:00.000Z"}"#);

        let outcome = h
            .users
            .update_record(
                1,
                &UserPatch {
                    name: Some("Georgie Bluth".to_string()),
                    job: None,
                },
            )
            .await;

        assert!(outcome.is_ok());
        assert_eq!(h.users.state().items[0].first_name, "George");
        assert_eq!(h.transport.requests()[1].path, format!("{BASE}/users/1"));
    }

    #[tokio::test]
    async fn create_failure_surfaces_message() {
        let h = harness();
        h.transport.fail("connection reset");

        let outcome = h
            .users
            .create_record(&NewUser {
                name: "Jane Doe".to_string(),
                job: "jane@x.com".to_string(),
            })
            .await;

        assert_eq!(outcome.error(), Some(CREATE_USER_FAILED));
        assert_eq!(h.users.state().error.as_deref(), Some(CREATE_USER_FAILED));
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_matching_entry() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(204, "");

        let outcome = h.users.delete_record(2).await;

        assert_eq!(outcome, Outcome::Ok(2));
        let state = h.users.state();
        assert_eq!(state.items, vec![user(1, "George", "Bluth")]);
        assert_eq!(h.transport.requests()[1].method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn plain_200_counts_as_success_for_create_and_delete() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(
            200,
            r#"{"name":"Jane Doe","job":"jane@x.com","id":"731","createdAt":"2024-01-01T00:00:00.000Z"}"#,
        );
        h.transport.respond(200, "");

        let created = h
            .users
            .create_record(&NewUser {
                name: "Jane Doe".to_string(),
                job: "jane@x.com".to_string(),
            })
            .await;
        let deleted = h.users.delete_record(1).await;

        assert!(created.is_ok());
        assert_eq!(deleted, Outcome::Ok(1));
        let state = h.users.state();
        assert_eq!(state.items, vec![user(2, "Janet", "Weaver")]);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn delete_failure_keeps_items() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(404, "{}");

        h.users.delete_record(2).await;

        let state = h.users.state();
        assert_eq!(state.items, first_page());
        assert_eq!(state.error.as_deref(), Some(DELETE_USER_FAILED));
    }

    #[test]
    fn delete_of_absent_id_is_a_no_op() {
        let mut state = CollectionView {
            items: first_page(),
            ..CollectionView::default()
        };
        reduce(&mut state, UsersAction::Delete(Outcome::Ok(99)));
        assert_eq!(state.items, first_page());
    }

    #[tokio::test]
    async fn fetch_record_sets_current() {
        let h = harness();
        h.transport.respond(
            200,
            &serde_json::json!({"data": user(2, "Janet", "Weaver")}).to_string(),
        );

        h.users.fetch_record(2).await;

        assert_eq!(h.users.state().current, Some(user(2, "Janet", "Weaver")));
        h.transport.respond(404, "{}");
        h.users.fetch_record(23).await;
        let state = h.users.state();
        assert_eq!(state.error.as_deref(), Some(FETCH_USER_FAILED));
        assert_eq!(state.current, Some(user(2, "Janet", "Weaver")));
    }

    #[test]
    fn search_is_case_insensitive_over_three_fields() {
        let mut state = CollectionView {
            items: vec![
                user(1, "George", "Bluth"),
                user(2, "Janet", "Weaver"),
                user(3, "Emma", "Wong"),
            ],
            ..CollectionView::default()
        };
        reduce(&mut state, UsersAction::SetSearchQuery("WEAV".to_string()));
        assert_eq!(state.visible().len(), 1);
        reduce(&mut state, UsersAction::SetSearchQuery("w".to_string()));
        let ids: Vec<u64> = state.visible().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3]);
        reduce(&mut state, UsersAction::SetSearchQuery(String::new()));
        assert_eq!(state.visible().len(), 3);
        assert_eq!(state.items.len(), 3);
    }

    #[test]
    fn search_commutes_with_view_mode() {
        let base = CollectionView {
            items: first_page(),
            ..CollectionView::default()
        };

        let mut a = base.clone();
        reduce(&mut a, UsersAction::SetSearchQuery("janet".to_string()));
        let once: Vec<UserRecord> = a.visible().into_iter().cloned().collect();
        reduce(&mut a, UsersAction::SetViewMode(ViewMode::Card));

        let mut b = base;
        reduce(&mut b, UsersAction::SetViewMode(ViewMode::Card));
        reduce(&mut b, UsersAction::SetSearchQuery("janet".to_string()));

        assert_eq!(a.visible(), b.visible());
        let twice: Vec<UserRecord> = a.visible().into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn setters_issue_no_requests() {
        let h = harness();
        h.users.set_search_query("bluth");
        h.users.set_view_mode(ViewMode::Card);
        h.users.set_pagination(3, 5);

        let state = h.users.state();
        assert_eq!(state.search_query, "bluth");
        assert_eq!(state.view_mode, ViewMode::Card);
        assert_eq!(state.pagination.page, 3);
        assert_eq!(state.pagination.per_page, 5);
        assert!(h.transport.requests().is_empty());
        assert!(h.users.visible().is_empty());
    }

    #[tokio::test]
    async fn clear_error_only_clears_message() {
        let h = harness();
        h.transport.respond(200, &page_json(1, 2, 4, &first_page()));
        h.users.fetch_page(1, 2).await;
        h.transport.respond(500, r#"{"error":"boom"}"#);
        h.users.fetch_page(2, 2).await;

        h.users.clear_error();

        let state = h.users.state();
        assert_eq!(state.error, None);
        assert_eq!(state.items, first_page());
    }

    #[tokio::test]
    async fn stale_page_is_discarded_under_latest_issued() {
        let h = harness_with(FetchOrdering::LatestIssued);
        let gate1 = h.transport.gate(&format!("{BASE}/users?page=1&per_page=2"));
        let gate2 = h.transport.gate(&format!("{BASE}/users?page=2&per_page=2"));

        let mut first = Box::pin(h.users.fetch_page(1, 2));
        start(&mut first).await;
        let mut second = Box::pin(h.users.fetch_page(2, 2));
        start(&mut second).await;
        assert!(h.users.state().loading);

        let page2 = vec![user(3, "Emma", "Wong"), user(4, "Eve", "Holt")];
        gate2.send(response(200, &page_json(2, 2, 4, &page2))).unwrap();
        second.await;
        gate1.send(response(200, &page_json(1, 2, 4, &first_page()))).unwrap();
        let stale = first.await;

        assert!(stale.is_ok());
        let state = h.users.state();
        assert_eq!(state.pagination.page, 2);
        assert_eq!(state.items, page2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn stale_page_wins_under_arrival_order() {
        let h = harness_with(FetchOrdering::ArrivalOrder);
        let gate1 = h.transport.gate(&format!("{BASE}/users?page=1&per_page=2"));
        let gate2 = h.transport.gate(&format!("{BASE}/users?page=2&per_page=2"));

        let mut first = Box::pin(h.users.fetch_page(1, 2));
        start(&mut first).await;
        let mut second = Box::pin(h.users.fetch_page(2, 2));
        start(&mut second).await;

        let page2 = vec![user(3, "Emma", "Wong"), user(4, "Eve", "Holt")];
        gate2.send(response(200, &page_json(2, 2, 4, &page2))).unwrap();
        second.await;
        gate1.send(response(200, &page_json(1, 2, 4, &first_page()))).unwrap();
        first.await;

        let state = h.users.state();
        assert_eq!(state.pagination.page, 1);
        assert_eq!(state.items, first_page());
    }

    #[tokio::test]
    async fn invalid_form_issues_no_request() {
        let h = harness();
        let form = UserForm {
            first_name: "J".to_string(),
            ..UserForm::default()
        };

        let errors = h.users.submit_form(None, &form).await.unwrap_err();

        assert_eq!(errors.0.len(), 4);
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn form_submission_picks_create_or_update() {
        let h = harness();
        let form = UserForm {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@x.com".to_string(),
            avatar: "https://reqres.in/img/faces/7-image.jpg".to_string(),
        };
        h.transport.respond(
            201,
            r#"{"name":"Jane Doe","job":"jane@x.com","id":"1","createdAt":"2024-01-01T00:00:00.000Z"}"#,
        );
        h.transport
            .respond(200, r#"{"name":"Jane Doe","job":"jane@x.com","updatedAt":"2024-01-01T00:00:00.000Z"}"#);

        assert!(h.users.submit_form(None, &form).await.unwrap().is_ok());
        assert!(h.users.submit_form(Some(7), &form).await.unwrap().is_ok());

        let sent = h.transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[1].method, HttpMethod::Put);
        assert_eq!(sent[1].path, format!("{BASE}/users/7"));
        let body: serde_json::Value = serde_json::from_str(sent[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "Jane Doe", "job": "jane@x.com"}));
        assert_eq!(h.credentials.ephemeral().get(TOKEN_KEY).as_deref(), Some("abc"));
    }
}
