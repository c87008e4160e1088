//! Tab workspace - the collection of request drafts and the active-tab pointer
//!
//! Mutations are synchronous. Dispatch results are folded back in through
//! `commit_dispatch`, whichever send resolves last wins the `response` slot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::constants::{default_user_agent, DEFAULT_HTTP_URL, DEFAULT_TAB_NAME};
use crate::entries::{Entry, EntryList, EntryListKind};
use crate::error::DispatchError;
use crate::ids::TabId;
use crate::models::{AuthType, DispatchResult, HttpMethod};

/// One request draft
#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub parameters: EntryList,
    pub headers: EntryList,
    pub variables: EntryList,
    pub body: String,
    pub auth: AuthType,
    pub response: Option<DispatchResult>,
    /// Message of the last failed send, cleared by a successful one
    pub error: Option<String>,
    pub is_dirty: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tab {
    pub fn entries(&self, kind: EntryListKind) -> &EntryList {
        match kind {
            EntryListKind::Parameters => &self.parameters,
            EntryListKind::Headers => &self.headers,
            EntryListKind::Variables => &self.variables,
        }
    }

    fn entries_mut(&mut self, kind: EntryListKind) -> &mut EntryList {
        match kind {
            EntryListKind::Parameters => &mut self.parameters,
            EntryListKind::Headers => &mut self.headers,
            EntryListKind::Variables => &mut self.variables,
        }
    }
}

/// Overrides applied on top of the default draft when opening a tab
#[derive(Clone, Debug, Default)]
pub struct TabDraft {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub parameters: Option<EntryList>,
    pub headers: Option<EntryList>,
    pub variables: Option<EntryList>,
    pub body: Option<String>,
    pub auth: Option<AuthType>,
}

/// Shallow field changes for `update_tab`
#[derive(Clone, Debug, Default)]
pub struct TabPatch {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub parameters: Option<EntryList>,
    pub headers: Option<EntryList>,
    pub variables: Option<EntryList>,
    pub body: Option<String>,
    pub auth: Option<AuthType>,
}

/// Owns all tabs and which one is active
pub struct TabWorkspace {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    in_flight: usize,
    default_url: String,
    clock: Arc<dyn Clock>,
}

impl Default for TabWorkspace {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl TabWorkspace {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        TabWorkspace {
            tabs: Vec::new(),
            active: None,
            in_flight: 0,
            default_url: DEFAULT_HTTP_URL.to_string(),
            clock,
        }
    }

    /// Overrides the URL given to new tabs
    pub fn with_default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = url.into();
        self
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.tab(id))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
            .and_then(|id| self.tabs.iter().position(|t| t.id == id))
    }

    /// Opens a tab built from defaults plus `draft`, appends it and activates it
    pub fn add_tab(&mut self, draft: TabDraft) -> TabId {
        let now = self.clock.now();
        let tab = Tab {
            id: TabId::new(),
            name: draft.name.unwrap_or_else(|| DEFAULT_TAB_NAME.to_string()),
            method: draft.method.unwrap_or_default(),
            url: draft.url.unwrap_or_else(|| self.default_url.clone()),
            parameters: draft.parameters.unwrap_or_default(),
            headers: draft.headers.unwrap_or_else(|| {
                EntryList::with_locked(vec![Entry::new("User-Agent", default_user_agent())])
            }),
            variables: draft.variables.unwrap_or_default(),
            body: draft.body.unwrap_or_default(),
            auth: draft.auth.unwrap_or_default(),
            response: None,
            error: None,
            is_dirty: false,
            created_at: now,
            updated_at: now,
        };
        let id = tab.id;
        tracing::debug!(tab = %id, "Opened tab");
        self.tabs.push(tab);
        self.active = Some(id);
        id
    }

    /// Removes a tab. Closing the active tab activates its left neighbour,
    /// else the first remaining tab, else nothing.
    pub fn close_tab(&mut self, id: TabId) -> bool {
        let Some(pos) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tabs.remove(pos);
        tracing::debug!(tab = %id, "Closed tab");

        if self.active == Some(id) {
            self.active = if self.tabs.is_empty() {
                None
            } else if pos > 0 {
                Some(self.tabs[pos - 1].id)
            } else {
                Some(self.tabs[0].id)
            };
        }
        true
    }

    pub fn switch_tab(&mut self, id: TabId) -> bool {
        if self.tab(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Activates the tab to the right of the active one, wrapping around
    pub fn next_tab(&mut self) {
        if let Some(i) = self.active_index() {
            self.active = Some(self.tabs[(i + 1) % self.tabs.len()].id);
        }
    }

    /// Activates the tab to the left of the active one, wrapping around
    pub fn prev_tab(&mut self) {
        if let Some(i) = self.active_index() {
            let prev = i.checked_sub(1).unwrap_or(self.tabs.len() - 1);
            self.active = Some(self.tabs[prev].id);
        }
    }

    /// Merges `patch` into the tab and stamps `updated_at`.
    ///
    /// `dirty` overrides the dirty flag; `None` marks the tab dirty.
    pub fn update_tab(&mut self, id: TabId, patch: TabPatch, dirty: Option<bool>) -> bool {
        let now = self.clock.now();
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };

        if let Some(name) = patch.name {
            tab.name = name;
        }
        if let Some(method) = patch.method {
            tab.method = method;
        }
        if let Some(url) = patch.url {
            tab.url = url;
        }
        if let Some(parameters) = patch.parameters {
            tab.parameters = parameters;
        }
        if let Some(headers) = patch.headers {
            tab.headers = headers;
        }
        if let Some(variables) = patch.variables {
            tab.variables = variables;
        }
        if let Some(body) = patch.body {
            tab.body = body;
        }
        if let Some(auth) = patch.auth {
            tab.auth = auth;
        }

        tab.updated_at = now;
        tab.is_dirty = dirty.unwrap_or(true);
        true
    }

    /// Runs a mutation against one of the tab's entry lists.
    ///
    /// The closure reports whether it changed anything; only then is the tab
    /// marked dirty. Returns `None` if the tab does not exist.
    pub fn edit_entries<R>(
        &mut self,
        id: TabId,
        kind: EntryListKind,
        edit: impl FnOnce(&mut EntryList) -> (bool, R),
    ) -> Option<R> {
        let now = self.clock.now();
        let tab = self.tab_mut(id)?;
        let (changed, result) = edit(tab.entries_mut(kind));
        if changed {
            tab.updated_at = now;
            tab.is_dirty = true;
        }
        Some(result)
    }

    /// Marks a send as outstanding
    pub fn begin_dispatch(&mut self) {
        self.in_flight += 1;
    }

    /// True while any send is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Folds a resolved send into its tab.
    ///
    /// Success replaces the response snapshot. A network failure records the
    /// error and keeps the previous response. Both clear the dirty flag.
    pub fn commit_dispatch(&mut self, id: TabId, outcome: &Result<DispatchResult, DispatchError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let Some(tab) = self.tab_mut(id) else {
            tracing::debug!(tab = %id, "Dropping result for closed tab");
            return;
        };

        match outcome {
            Ok(result) => {
                tab.response = Some(result.clone());
                tab.error = None;
                tab.is_dirty = false;
            }
            // Validation failures never reach the network and leave the draft as-is
            Err(DispatchError::InvalidUrl { .. }) => {}
            Err(err @ DispatchError::Network(_)) => {
                // A failed send still counts as resolved for dirty tracking
                tab.error = Some(err.to_string());
                tab.is_dirty = false;
            }
        }
    }

    fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::entries::EntryField;
    use crate::error::NetworkError;
    use crate::models::ResponseBody;
    use chrono::TimeZone;

    fn workspace() -> TabWorkspace {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        TabWorkspace::new(Arc::new(FixedClock(at)))
    }

    fn ok_result(status: u16) -> DispatchResult {
        DispatchResult {
            status,
            status_text: "OK".into(),
            headers: vec![],
            body: ResponseBody::Text("hi".into()),
            elapsed_ms: 3,
            size_bytes: 2,
        }
    }

    #[test]
    fn test_add_tab_uses_defaults_and_activates() {
        let mut ws = workspace();
        let id = ws.add_tab(TabDraft::default());
        let tab = ws.active_tab().unwrap();
        assert_eq!(tab.id, id);
        assert_eq!(tab.method, HttpMethod::GET);
        assert_eq!(tab.url, DEFAULT_HTTP_URL);
        assert_eq!(tab.parameters.len(), 1);
        assert_eq!(tab.variables.len(), 1);
        assert!(!tab.is_dirty);
        assert!(tab.headers.entries().last().unwrap().locked);
    }

    #[test]
    fn test_add_tab_merges_overrides() {
        let mut ws = workspace();
        ws.add_tab(TabDraft {
            method: Some(HttpMethod::POST),
            url: Some("https://api.example.com".into()),
            ..TabDraft::default()
        });
        let tab = ws.active_tab().unwrap();
        assert_eq!(tab.method, HttpMethod::POST);
        assert_eq!(tab.url, "https://api.example.com");
        assert_eq!(tab.name, DEFAULT_TAB_NAME);
    }

    #[test]
    fn test_close_active_middle_tab_activates_left_neighbour() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        let b = ws.add_tab(TabDraft::default());
        let _c = ws.add_tab(TabDraft::default());
        ws.switch_tab(b);

        assert!(ws.close_tab(b));
        assert_eq!(ws.active_tab_id(), Some(a));
    }

    #[test]
    fn test_close_first_active_tab_activates_new_first() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        let b = ws.add_tab(TabDraft::default());
        ws.switch_tab(a);
        ws.close_tab(a);
        assert_eq!(ws.active_tab_id(), Some(b));
    }

    #[test]
    fn test_close_inactive_tab_keeps_pointer() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        let b = ws.add_tab(TabDraft::default());
        ws.close_tab(a);
        assert_eq!(ws.active_tab_id(), Some(b));
    }

    #[test]
    fn test_close_last_tab_empties_workspace() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.close_tab(a);
        assert!(ws.is_empty());
        assert_eq!(ws.active_tab_id(), None);
        assert!(ws.active_tab().is_none());
    }

    #[test]
    fn test_switch_to_unknown_tab_is_noop() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        assert!(!ws.switch_tab(TabId::new()));
        assert_eq!(ws.active_tab_id(), Some(a));
    }

    #[test]
    fn test_update_marks_dirty_unless_overridden() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.update_tab(
            a,
            TabPatch {
                url: Some("https://x.example.org".into()),
                ..TabPatch::default()
            },
            None,
        );
        assert!(ws.tab(a).unwrap().is_dirty);

        ws.update_tab(a, TabPatch::default(), Some(false));
        assert!(!ws.tab(a).unwrap().is_dirty);
    }

    #[test]
    fn test_entry_edits_mark_tab_dirty_only_on_change() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        let unknown = crate::ids::EntryId::new();
        ws.edit_entries(a, EntryListKind::Parameters, |list| {
            (list.update(unknown, EntryField::Key("x".into())), ())
        });
        assert!(!ws.tab(a).unwrap().is_dirty);

        let scratch = ws.tab(a).unwrap().parameters.entries()[0].id;
        ws.edit_entries(a, EntryListKind::Parameters, |list| {
            (list.update(scratch, EntryField::Key("page".into())), ())
        });
        let tab = ws.tab(a).unwrap();
        assert!(tab.is_dirty);
        assert_eq!(tab.parameters.len(), 2);
    }

    #[test]
    fn test_commit_success_stores_response_and_cleans() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.update_tab(a, TabPatch::default(), None);
        ws.begin_dispatch();
        assert!(ws.is_loading());

        ws.commit_dispatch(a, &Ok(ok_result(200)));
        let tab = ws.tab(a).unwrap();
        assert_eq!(tab.response.as_ref().unwrap().status, 200);
        assert!(!tab.is_dirty);
        assert!(!ws.is_loading());
    }

    #[test]
    fn test_commit_network_failure_keeps_response_and_clears_dirty() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.commit_dispatch(a, &Ok(ok_result(200)));
        ws.update_tab(a, TabPatch::default(), None);

        let failure = Err(DispatchError::Network(NetworkError::Transport("dns".into())));
        ws.commit_dispatch(a, &failure);
        let tab = ws.tab(a).unwrap();
        assert_eq!(tab.response.as_ref().unwrap().status, 200);
        assert!(tab.error.is_some());
        assert!(!tab.is_dirty);
    }

    #[test]
    fn test_last_commit_wins() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.begin_dispatch();
        ws.begin_dispatch();
        ws.commit_dispatch(a, &Ok(ok_result(201)));
        ws.commit_dispatch(a, &Ok(ok_result(202)));
        assert_eq!(ws.tab(a).unwrap().response.as_ref().unwrap().status, 202);
    }

    #[test]
    fn test_commit_for_closed_tab_is_dropped() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        ws.close_tab(a);
        ws.begin_dispatch();
        ws.commit_dispatch(a, &Ok(ok_result(200)));
        assert!(ws.is_empty());
        assert!(!ws.is_loading());
    }

    #[test]
    fn test_next_and_prev_tab_wrap() {
        let mut ws = workspace();
        let a = ws.add_tab(TabDraft::default());
        let b = ws.add_tab(TabDraft::default());
        ws.next_tab();
        assert_eq!(ws.active_tab_id(), Some(a));
        ws.prev_tab();
        assert_eq!(ws.active_tab_id(), Some(b));
    }
}
