use wayfinder::Role;

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetText(Role, String),
    Submit,
    Swap,
    Clear,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
start <place>   set the start location
dest <place>    set the destination
submit          look up both locations and show the way between them
swap            exchange start and destination
clear           forget both locations
status          show what is known
help            show this text
quit            exit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.find(char::is_whitespace) {
            Some(i) => (&line[..i], line[i..].trim()),
            None => (line, ""),
        };

        let command = match word {
            "start" | "from" => Command::SetText(Role::Start, rest.to_string()),
            "dest" | "to" => Command::SetText(Role::Destination, rest.to_string()),
            "submit" | "go" => Command::Submit,
            "swap" => Command::Swap,
            "clear" => Command::Clear,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err("Type a command, or help.".to_string()),
            other => return Err(format!("Unknown command {:?}, try help.", other)),
        };

        match command {
            Command::SetText(..) => Ok(command),
            _ if !rest.is_empty() => Err(format!("{} takes no arguments.", word)),
            _ => Ok(command),
        }
    }
}

#[test]
fn parse_commands() {
    assert_eq!(
        Command::parse("start  New York City "),
        Ok(Command::SetText(Role::Start, "New York City".into()))
    );
    assert_eq!(
        Command::parse("dest Paris"),
        Ok(Command::SetText(Role::Destination, "Paris".into()))
    );
    assert_eq!(
        Command::parse("dest"),
        Ok(Command::SetText(Role::Destination, String::new()))
    );
    assert_eq!(Command::parse("submit"), Ok(Command::Submit));
    assert_eq!(Command::parse("  swap"), Ok(Command::Swap));
    assert_eq!(Command::parse("quit"), Ok(Command::Quit));
}

#[test]
fn reject_bad_commands() {
    assert!(Command::parse("").is_err());
    assert!(Command::parse("teleport London").is_err());
    assert!(Command::parse("swap now").is_err());
}
