use anyhow::Result;
use chrono::Local;
use tokio::task::JoinHandle;

use crate::client::AgentClient;
use crate::command::{self, Command, IssueFields, ISSUE_FIELD_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Form,
    Response,
}

/// What the response pane shows. Exactly one variant is live at a time;
/// rendering is a projection of this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseView {
    Hidden,
    Loading,
    Reply(String),
    Error(String),
}

/// One dispatched request. Requests are never cancelled; stale completions
/// are dropped by id when they resolve.
pub struct PendingRequest {
    pub id: u64,
    pub handle: JoinHandle<Result<String>>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub command: Command,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Form state
    pub query_input: String,
    pub issue: IssueFields,
    pub issue_field: usize,
    pub cursor: usize, // char position in the active input

    // Blocking validation notice; while set, keys only dismiss it
    pub notice: Option<String>,

    // Response state
    pub response: ResponseView,
    pub response_scroll: u16,
    pub response_height: u16,
    pub total_response_lines: u16,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // In-flight requests and the stale-response guard
    pub request_seq: u64,
    pub pending: Vec<PendingRequest>,

    pub client: AgentClient,
}

impl App {
    pub fn new(client: AgentClient) -> Self {
        // Deadline defaults to today, local calendar date
        let issue = IssueFields {
            deadline: Local::now().format("%Y-%m-%d").to_string(),
            ..IssueFields::default()
        };

        Self {
            should_quit: false,
            command: Command::Ask,
            input_mode: InputMode::Normal,
            focus: FocusPane::Form,

            query_input: String::new(),
            issue,
            issue_field: 0,
            cursor: 0,

            notice: None,

            response: ResponseView::Hidden,
            response_scroll: 0,
            response_height: 0,
            total_response_lines: 0,
            animation_frame: 0,

            request_seq: 0,
            pending: Vec::new(),

            client,
        }
    }

    /// Activate a command tab. Idempotent: re-selecting the active command
    /// yields the same visible state. Always hides the response pane.
    pub fn select_command(&mut self, command: Command) {
        self.command = command;
        self.input_mode = InputMode::Normal;
        self.focus = FocusPane::Form;
        self.response = ResponseView::Hidden;
        self.response_scroll = 0;
    }

    pub fn next_command(&mut self) {
        self.select_command(self.command.next());
    }

    pub fn prev_command(&mut self) {
        self.select_command(self.command.prev());
    }

    // Active input helpers
    pub fn active_input(&self) -> Option<&String> {
        match self.command {
            Command::Ask => Some(&self.query_input),
            Command::RiskCheck => None,
            Command::UpdateIssue => self.issue.field(self.issue_field),
        }
    }

    pub fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.command {
            Command::Ask => Some(&mut self.query_input),
            Command::RiskCheck => None,
            Command::UpdateIssue => self.issue.field_mut(self.issue_field),
        }
    }

    /// Enter editing with the cursor at the end of the active input.
    pub fn start_editing(&mut self) {
        if let Some(input) = self.active_input() {
            self.cursor = input.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    // Issue field focus
    pub fn issue_field_down(&mut self) {
        self.issue_field = (self.issue_field + 1).min(ISSUE_FIELD_COUNT - 1);
        self.reset_cursor_to_end();
    }

    pub fn issue_field_up(&mut self) {
        self.issue_field = self.issue_field.saturating_sub(1);
        self.reset_cursor_to_end();
    }

    /// Advance to the next issue field, wrapping after the last one.
    pub fn issue_field_next_wrapping(&mut self) {
        self.issue_field = (self.issue_field + 1) % ISSUE_FIELD_COUNT;
        self.reset_cursor_to_end();
    }

    fn reset_cursor_to_end(&mut self) {
        self.cursor = self
            .active_input()
            .map(|s| s.chars().count())
            .unwrap_or(0);
    }

    /// Validate the active form and dispatch. Validation failures set the
    /// blocking notice and never issue a request.
    pub fn submit(&mut self) {
        let built = match self.command {
            Command::Ask => command::build_ask(&self.query_input),
            Command::RiskCheck => Ok(command::build_risk_alert()),
            Command::UpdateIssue => command::build_update_issue(&self.issue),
        };

        match built {
            Ok(text) => self.dispatch(text),
            Err(err) => {
                self.input_mode = InputMode::Normal;
                self.notice = Some(err.to_string());
            }
        }
    }

    /// Fire one request. A second submission while another is pending is not
    /// prevented; the id guard decides whose result is displayed.
    pub fn dispatch(&mut self, command_text: String) {
        self.request_seq += 1;
        let id = self.request_seq;

        self.input_mode = InputMode::Normal;
        self.response = ResponseView::Loading;
        self.response_scroll = 0;

        let client = self.client.clone();
        let handle = tokio::spawn(async move { client.send(&command_text).await });
        self.pending.push(PendingRequest { id, handle });
    }

    /// Reap finished requests. Only the result matching the latest issued id
    /// reaches the display; stale completions are dropped.
    pub async fn poll_pending(&mut self) {
        let mut i = 0;
        while i < self.pending.len() {
            if !self.pending[i].handle.is_finished() {
                i += 1;
                continue;
            }
            let request = self.pending.remove(i);
            let outcome = match request.handle.await {
                Ok(result) => result,
                Err(err) => Err(anyhow::anyhow!("Request task failed: {err}")),
            };
            if request.id == self.request_seq {
                self.apply_outcome(outcome);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: Result<String>) {
        self.response_scroll = 0;
        self.focus = FocusPane::Response;
        self.response = match outcome {
            Ok(text) => ResponseView::Reply(text),
            Err(err) => ResponseView::Error(format!(
                "An error occurred:\n\n{err}\n\nCheck that the agent service is reachable."
            )),
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.response == ResponseView::Loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Response scrolling
    pub fn scroll_response_down(&mut self) {
        let max_scroll = self
            .total_response_lines
            .saturating_sub(self.response_height);
        if self.response_scroll < max_scroll {
            self.response_scroll = self.response_scroll.saturating_add(1);
        }
    }

    pub fn scroll_response_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    fn test_app() -> App {
        // Port 9 is discard; nothing in these tests may reach the network
        // unless it goes through a spawned mock server.
        App::new(AgentClient::new("http://127.0.0.1:9/"))
    }

    async fn spawn_agent(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    async fn drain_pending(app: &mut App) {
        while !app.pending.is_empty() {
            app.poll_pending().await;
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn deadline_defaults_to_today() {
        let app = test_app();
        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(app.issue.deadline, today);
    }

    #[test]
    fn tab_switching_is_idempotent_and_hides_response() {
        let mut app = test_app();
        app.response = ResponseView::Reply("old".to_string());

        app.select_command(Command::RiskCheck);
        app.select_command(Command::Ask);
        assert_eq!(app.command, Command::Ask);
        assert_eq!(app.response, ResponseView::Hidden);

        // Re-selecting the active command changes nothing further
        app.select_command(Command::Ask);
        assert_eq!(app.command, Command::Ask);
        assert_eq!(app.response, ResponseView::Hidden);
    }

    #[test]
    fn blank_ask_sets_notice_without_dispatching() {
        let mut app = test_app();
        app.query_input = "   ".to_string();
        app.submit();
        assert!(app.notice.is_some());
        assert!(app.pending.is_empty());
        assert_eq!(app.response, ResponseView::Hidden);
    }

    #[test]
    fn incomplete_issue_sets_notice_without_dispatching() {
        let mut app = test_app();
        app.issue.category = "Technical".to_string();
        // content, vendor, assignee left empty; deadline has its default
        app.submit_issue_and_expect_notice(&["content", "vendor", "assignee"]);
    }

    impl App {
        fn submit_issue_and_expect_notice(&mut self, expected: &[&str]) {
            self.select_command(Command::UpdateIssue);
            self.submit();
            let notice = self.notice.clone().expect("expected a validation notice");
            for name in expected {
                assert!(notice.contains(name), "notice should name {name}: {notice}");
            }
            assert!(self.pending.is_empty());
        }
    }

    #[tokio::test]
    async fn risk_check_dispatches_and_displays_reply() {
        let router = Router::new().route("/", post(|| async { Json(json!({"text": "OK"})) }));
        let endpoint = spawn_agent(router).await;

        let mut app = App::new(AgentClient::new(&endpoint));
        app.select_command(Command::RiskCheck);
        app.submit();
        assert_eq!(app.response, ResponseView::Loading);

        drain_pending(&mut app).await;
        assert_eq!(app.response, ResponseView::Reply("OK".to_string()));
        assert_eq!(app.focus, FocusPane::Response);
    }

    #[tokio::test]
    async fn server_error_is_displayed_with_status_and_ends_loading() {
        let router = Router::new().route(
            "/",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let endpoint = spawn_agent(router).await;

        let mut app = App::new(AgentClient::new(&endpoint));
        app.select_command(Command::RiskCheck);
        app.submit();
        drain_pending(&mut app).await;

        match &app.response {
            ResponseView::Error(message) => {
                assert!(message.contains("500"), "error should name the status: {message}");
            }
            other => panic!("expected error view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_completion_never_overwrites_newer_result() {
        let mut app = test_app();

        // Two resolved requests; only the one matching request_seq may land.
        app.pending.push(PendingRequest {
            id: 1,
            handle: tokio::spawn(async { Ok("stale".to_string()) }),
        });
        app.pending.push(PendingRequest {
            id: 2,
            handle: tokio::spawn(async { Ok("fresh".to_string()) }),
        });
        app.request_seq = 2;
        app.response = ResponseView::Loading;

        drain_pending(&mut app).await;
        assert_eq!(app.response, ResponseView::Reply("fresh".to_string()));
    }

    #[tokio::test]
    async fn stale_completion_keeps_loading_while_newer_is_in_flight() {
        let mut app = test_app();

        app.pending.push(PendingRequest {
            id: 1,
            handle: tokio::spawn(async { Ok("stale".to_string()) }),
        });
        app.request_seq = 2; // a newer request is still pending elsewhere
        app.response = ResponseView::Loading;

        drain_pending(&mut app).await;
        assert_eq!(app.response, ResponseView::Loading);
    }
}
