//! Line commands for the interactive player. Positions typed by the user are
//! 1-based and converted here.

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Play(usize),
    Toggle,
    Next,
    Prev,
    Seek(f64),
    Volume(u8),
    Mute,
    Shuffle,
    Video,
    Status,
    Playlist(PlaylistCommand),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistCommand {
    List,
    New(String),
    Remove(u64),
    Rename(u64, String),
    Cover(u64, Option<String>),
    /// Adds the given search result.
    Add(u64, usize),
    Move(u64, usize, usize),
    Play(u64, usize),
}

pub const HELP: &str = "\
commands:
  search <query>            search the catalog (plays the first hit if nothing is queued)
  play <n>                  play search result n
  toggle | next | prev      transport
  seek <0..1>               seek to a fraction of the track
  vol <0-100> | mute        volume
  shuffle | video           toggle shuffle / video embed
  status                    show what is playing
  pl list                   list playlists
  pl new <name>             create a playlist
  pl rm <id>                delete a playlist
  pl rename <id> <name>     rename a playlist
  pl cover <id> [url]       set or clear the cover image
  pl add <id> <n>           add search result n to a playlist
  pl move <id> <from> <to>  reorder a playlist
  pl play <id> [n]          play a playlist from track n
  quit";

/// `Ok(None)` for blank input.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = split_word(line);
    let command = match word {
        "search" | "s" => {
            if rest.is_empty() {
                return Err("usage: search <query>".to_string());
            }
            Command::Search(rest.to_string())
        }
        "play" | "p" => Command::Play(position(rest, "play <n>")?),
        "toggle" | "t" => Command::Toggle,
        "next" | "n" => Command::Next,
        "prev" => Command::Prev,
        "seek" => {
            let fraction: f64 = rest
                .parse()
                .map_err(|_| "usage: seek <fraction between 0 and 1>".to_string())?;
            Command::Seek(fraction)
        }
        "vol" | "volume" => {
            let volume: u8 = rest
                .parse()
                .map_err(|_| "usage: vol <0-100>".to_string())?;
            Command::Volume(volume)
        }
        "mute" => Command::Mute,
        "shuffle" => Command::Shuffle,
        "video" => Command::Video,
        "status" => Command::Status,
        "pl" | "playlist" => Command::Playlist(parse_playlist(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(Some(command))
}

fn parse_playlist(input: &str) -> Result<PlaylistCommand, String> {
    let (word, rest) = split_word(input);
    let command = match word {
        "" | "list" | "ls" => PlaylistCommand::List,
        "new" => {
            if rest.is_empty() {
                return Err("usage: pl new <name>".to_string());
            }
            PlaylistCommand::New(rest.to_string())
        }
        "rm" => PlaylistCommand::Remove(playlist_id(rest, "pl rm <id>")?),
        "rename" => {
            let (id, name) = split_word(rest);
            let id = playlist_id(id, "pl rename <id> <name>")?;
            PlaylistCommand::Rename(id, name.to_string())
        }
        "cover" => {
            let (id, url) = split_word(rest);
            let id = playlist_id(id, "pl cover <id> [url]")?;
            let url = (!url.is_empty()).then(|| url.to_string());
            PlaylistCommand::Cover(id, url)
        }
        "add" => {
            let (id, n) = split_word(rest);
            let usage = "pl add <id> <n>";
            PlaylistCommand::Add(playlist_id(id, usage)?, position(n, usage)?)
        }
        "move" => {
            let usage = "pl move <id> <from> <to>";
            let (id, rest) = split_word(rest);
            let (from, to) = split_word(rest);
            PlaylistCommand::Move(
                playlist_id(id, usage)?,
                position(from, usage)?,
                position(to, usage)?,
            )
        }
        "play" => {
            let usage = "pl play <id> [n]";
            let (id, n) = split_word(rest);
            let start = if n.is_empty() { 0 } else { position(n, usage)? };
            PlaylistCommand::Play(playlist_id(id, usage)?, start)
        }
        other => return Err(format!("unknown playlist command `{other}`")),
    };
    Ok(command)
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn position(raw: &str, usage: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("usage: {usage} (positions start at 1)")),
    }
}

fn playlist_id(raw: &str, usage: &str) -> Result<u64, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("usage: {usage}"))
}
