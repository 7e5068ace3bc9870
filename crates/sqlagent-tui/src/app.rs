use ratatui::layout::Rect;
use sqlagent_core::{transition, AgentClient, ChatState, Effect, Event, HealthStatus};

/// What the last `/health` probe said about the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Checking,
    Up { provider: Option<String> },
    Down(String),
}

impl BackendHealth {
    pub fn from_status(status: HealthStatus) -> Self {
        if status.is_ok() {
            BackendHealth::Up {
                provider: status.agent_provider,
            }
        } else {
            BackendHealth::Down(status.status)
        }
    }
}

pub struct App {
    pub should_quit: bool,

    // Conversation (only ever changed through `dispatch`)
    pub chat: ChatState,

    // Input line
    pub input_cursor: usize, // cursor position in chat.pending_input, in chars

    // Transcript viewport
    pub chat_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16, // inner height of the transcript pane, set during render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub client: AgentClient,
    pub health: BackendHealth,
}

impl App {
    pub fn new(client: AgentClient) -> Self {
        Self {
            should_quit: false,
            chat: ChatState::new(),
            input_cursor: 0,
            chat_scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_area: None,
            animation_frame: 0,
            client,
            health: BackendHealth::Checking,
        }
    }

    /// Applies one conversation event and returns the work it asks for.
    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let result = transition(&self.chat, event);
        if result.new_state.transcript.len() != self.chat.transcript.len() {
            // New messages pull the view back down to the latest one.
            self.follow_tail = true;
        }
        if result.new_state.pending_input != self.chat.pending_input {
            let len = result.new_state.pending_input.chars().count();
            self.input_cursor = self.input_cursor.min(len);
        }
        self.chat = result.new_state;
        result.effects
    }

    pub fn input(&self) -> &str {
        &self.chat.pending_input
    }

    pub fn can_edit(&self) -> bool {
        !self.chat.busy
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.busy {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Render clamps the result and re-enables tail following at the bottom.
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up(self.page_size());
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down(self.page_size());
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    fn page_size(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
