/// User commands from the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Quit,
}

impl Command {
    /// The command the single start/stop button issues in the current state
    pub fn toggle(running: bool) -> Self {
        if running {
            Command::Stop
        } else {
            Command::Start
        }
    }

    /// Human-readable description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Start",
            Command::Stop => "Stop",
            Command::Quit => "Quit",
        }
    }
}
