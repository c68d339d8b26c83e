//! Slash commands for the terminal front-end. Anything without a leading
//! slash is chat input.

use secrecy::SecretString;

use crate::error::ChannelError;
use crate::router::View;

pub const HELP: &str = "\
Commands:
  /login <email> <password>   sign in
  /logout                     sign out and reset the simulation
  /dashboard                  show counters and journeys
  /open <case_id>             open the chat for a journey
  /close                      close the chat
  /go <view> [case_id]        navigate (dashboard, survey, journey)
  /back                       previous view
  /feed [n]                   recent telemetry events
  /mode                       show the current user mode
  /help                       this text
  /quit                       exit
Anything else is sent to the open chat.";

const DEFAULT_FEED_COUNT: usize = 10;

#[derive(Debug)]
pub enum Command {
    Login { email: String, password: SecretString },
    Logout,
    Dashboard,
    Open(String),
    Close,
    Go { view: View, id: Option<String> },
    Back,
    Feed(usize),
    Mode,
    Help,
    Quit,
    Chat(String),
    Empty,
}

fn usage(text: &str) -> ChannelError {
    ChannelError::InvalidCommand(format!("Usage: {text}"))
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ChannelError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Self::Chat(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = parts.collect();

        match (name.as_str(), args.as_slice()) {
            ("login", [email, password]) => Ok(Self::Login {
                email: email.to_string(),
                password: SecretString::from(password.to_string()),
            }),
            ("login", _) => Err(usage("/login <email> <password>")),
            ("logout", []) => Ok(Self::Logout),
            ("dashboard", []) => Ok(Self::Dashboard),
            ("open", [case]) => Ok(Self::Open(case.to_uppercase())),
            ("open", _) => Err(usage("/open <case_id>")),
            ("close", []) => Ok(Self::Close),
            ("go", [view, rest @ ..]) if rest.len() <= 1 => {
                let view = View::parse(view).ok_or_else(|| usage("/go <view> [case_id]"))?;
                Ok(Self::Go {
                    view,
                    id: rest.first().map(|id| id.to_uppercase()),
                })
            }
            ("go", _) => Err(usage("/go <view> [case_id]")),
            ("back", []) => Ok(Self::Back),
            ("feed", []) => Ok(Self::Feed(DEFAULT_FEED_COUNT)),
            ("feed", [n]) => n
                .parse()
                .map(Self::Feed)
                .map_err(|_| usage("/feed [n]")),
            ("mode", []) => Ok(Self::Mode),
            ("help", _) => Ok(Self::Help),
            ("quit" | "exit", []) => Ok(Self::Quit),
            _ => Err(ChannelError::InvalidCommand(format!(
                "Unknown command: /{name}. Type /help for a list."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn plain_text_is_chat() {
        match Command::parse("  approve it please ").unwrap() {
            Command::Chat(text) => assert_eq!(text, "approve it please"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(Command::parse("   ").unwrap(), Command::Empty));
    }

    #[test]
    fn login_takes_two_args() {
        match Command::parse("/login hradmin@corespectrum.com Demo@1234").unwrap() {
            Command::Login { email, password } => {
                assert_eq!(email, "hradmin@corespectrum.com");
                assert_eq!(password.expose_secret(), "Demo@1234");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(Command::parse("/login only-email").is_err());
    }

    #[test]
    fn open_normalizes_case_id() {
        assert!(matches!(
            Command::parse("/open cs0002").unwrap(),
            Command::Open(id) if id == "CS0002"
        ));
        assert!(Command::parse("/open").is_err());
    }

    #[test]
    fn go_parses_view_and_optional_id() {
        assert!(matches!(
            Command::parse("/go journey cs0001").unwrap(),
            Command::Go { view: View::Journey, id: Some(id) } if id == "CS0001"
        ));
        assert!(matches!(
            Command::parse("/go survey").unwrap(),
            Command::Go {
                view: View::Survey,
                id: None
            }
        ));
        assert!(Command::parse("/go nowhere").is_err());
        assert!(Command::parse("/go journey a b").is_err());
    }

    #[test]
    fn feed_count() {
        assert!(matches!(
            Command::parse("/feed").unwrap(),
            Command::Feed(DEFAULT_FEED_COUNT)
        ));
        assert!(matches!(Command::parse("/feed 3").unwrap(), Command::Feed(3)));
        assert!(Command::parse("/feed lots").is_err());
    }

    #[test]
    fn unknown_command_mentions_help() {
        let err = Command::parse("/dance").unwrap_err();
        assert!(err.to_string().contains("/help"));
    }

    #[test]
    fn quit_aliases() {
        assert!(matches!(Command::parse("/quit").unwrap(), Command::Quit));
        assert!(matches!(Command::parse("/EXIT").unwrap(), Command::Quit));
    }
}
