use crate::repl::{self, Command, PlaylistCommand, HELP};
use crate::session::{PlaybackSession, SessionUpdate};
use playbar_core::{format_clock, urls, ArtistDetails, Direction, PlayerError, PlayerResult, Settings, Track};
use playbar_engine::RequestGate;
use playbar_library::local::write_settings;
use playbar_library::{LoadOutcome, PlaylistLibrary, RemoteFetch};
use playbar_remote::CatalogClient;
use playbar_transport::TransportEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type DetailsReply = (u64, Option<ArtistDetails>);
pub type SearchReply = (u64, PlayerResult<Vec<Track>>);

/// Senders the shell hands to background lookups.
#[derive(Clone)]
pub struct Outbox {
    details: mpsc::UnboundedSender<DetailsReply>,
    searches: mpsc::UnboundedSender<SearchReply>,
}

/// Receiving side of `Outbox`, drained by the event loop.
pub struct Inbox {
    pub details: mpsc::UnboundedReceiver<DetailsReply>,
    pub searches: mpsc::UnboundedReceiver<SearchReply>,
}

pub fn reply_channels() -> (Outbox, Inbox) {
    let (details, details_rx) = mpsc::unbounded_channel();
    let (searches, searches_rx) = mpsc::unbounded_channel();
    (
        Outbox { details, searches },
        Inbox {
            details: details_rx,
            searches: searches_rx,
        },
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive front end: turns typed commands into session and library calls
/// and prints the results.
pub struct Shell {
    session: PlaybackSession,
    library: PlaylistLibrary,
    catalog: CatalogClient,
    outbox: Outbox,
    details_gate: RequestGate,
    search_gate: RequestGate,
    results: Vec<Track>,
    settings: Settings,
}

impl Shell {
    pub fn new(
        session: PlaybackSession,
        library: PlaylistLibrary,
        catalog: CatalogClient,
        outbox: Outbox,
        settings: Settings,
    ) -> Self {
        Self {
            session,
            library,
            catalog,
            outbox,
            details_gate: RequestGate::new(),
            search_gate: RequestGate::new(),
            results: Vec::new(),
            settings,
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match repl::parse(line) {
            Ok(Some(command)) => match self.execute(command).await {
                Ok(flow) => flow,
                Err(err) => {
                    report_error(&err);
                    Flow::Continue
                }
            },
            Ok(None) => Flow::Continue,
            Err(usage) => {
                println!("{usage}");
                Flow::Continue
            }
        }
    }

    pub async fn on_transport_event(&mut self, event: TransportEvent) {
        let update = self.session.handle_event(event).await;
        self.report(update);
    }

    pub async fn on_tick(&mut self, generation: u64) {
        self.session.handle_tick(generation).await;
    }

    pub fn on_details(&self, token: u64, details: Option<ArtistDetails>) {
        if !self.details_gate.is_current(token) {
            debug!(token, "discarding artist details for a previous track");
            return;
        }
        let Some(details) = details else {
            return;
        };
        if let Some(name) = details.artist_name {
            match details.view_count {
                Some(views) => println!("  artist: {name} ({views} views)"),
                None => println!("  artist: {name}"),
            }
        }
        if let Some(image) = details.artist_image {
            println!("  image: {image}");
        }
    }

    /// Shows the results of the latest search; auto-plays them when nothing
    /// is queued yet.
    pub async fn on_search_results(&mut self, token: u64, result: PlayerResult<Vec<Track>>) {
        if !self.search_gate.is_current(token) {
            debug!(token, "discarding results of a superseded search");
            return;
        }
        let results = match result {
            Ok(results) => results,
            Err(err) => {
                report_error(&err);
                return;
            }
        };
        self.results = results;
        if self.results.is_empty() {
            println!("no results");
            return;
        }
        for (i, track) in self.results.iter().enumerate() {
            println!("{:>3}. {}", i + 1, track.title);
        }
        if self.session.controller().current_track().is_none() {
            match self.session.load_queue(self.results.clone(), 0).await {
                Ok(update) => self.report(update),
                Err(err) => report_error(&err),
            }
        }
    }

    /// Settles the playlist load once the remote fetch has answered.
    pub fn on_remote_playlists(&mut self, fetch: RemoteFetch) {
        let outcome = self.library.apply_remote(fetch);
        info!(?outcome, playlists = self.library.playlists().len(), "playlists loaded");
        if let LoadOutcome::RemoteApplied { playlists } = outcome {
            println!("synced {playlists} playlists from remote");
        }
    }

    pub fn shutdown(&mut self) {
        self.details_gate.cancel();
        self.search_gate.cancel();
        self.session.shutdown();
    }

    async fn execute(&mut self, command: Command) -> PlayerResult<Flow> {
        match command {
            Command::Search(query) => self.search(query),
            Command::Play(n) => {
                if n >= self.results.len() {
                    return Err(PlayerError::invalid(format!(
                        "no search result {}",
                        n + 1
                    )));
                }
                let update = self.session.load_queue(self.results.clone(), n).await?;
                self.report(update);
            }
            Command::Toggle => {
                let update = self.session.toggle_play().await?;
                self.report(update);
            }
            Command::Next => {
                let update = self.session.advance(Direction::Next).await?;
                self.report(update);
            }
            Command::Prev => {
                let update = self.session.advance(Direction::Previous).await?;
                self.report(update);
            }
            Command::Seek(fraction) => {
                let update = self.session.seek_to(fraction).await?;
                self.report(update);
            }
            Command::Volume(volume) => {
                let update = self.session.set_volume(volume).await;
                self.report(update);
                println!("volume {}", self.session.controller().state().volume);
            }
            Command::Mute => {
                let update = self.session.toggle_mute().await;
                self.report(update);
                println!("volume {}", self.session.controller().state().volume);
            }
            Command::Shuffle => {
                let on = self.session.toggle_shuffle();
                println!("shuffle {}", if on { "on" } else { "off" });
            }
            Command::Video => self.toggle_video()?,
            Command::Status => self.print_status(),
            Command::Playlist(command) => self.playlist(command).await?,
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self, query: String) {
        println!("searching for {query}...");
        let token = self.search_gate.begin();
        let catalog = self.catalog.clone();
        let searches = self.outbox.searches.clone();
        tokio::spawn(async move {
            let result = catalog.search(&query).await;
            searches.send((token, result)).ok();
        });
    }

    async fn playlist(&mut self, command: PlaylistCommand) -> PlayerResult<()> {
        match command {
            PlaylistCommand::List => {
                let playlists = self.library.playlists();
                if playlists.is_empty() {
                    println!("no playlists");
                }
                for playlist in playlists.iter() {
                    println!(
                        "{:>14}  {} ({} tracks)",
                        playlist.id,
                        playlist.name,
                        playlist.tracks.len()
                    );
                    if let Some(cover) = playlist.cover() {
                        println!("{:>14}  cover: {cover}", "");
                    }
                }
            }
            PlaylistCommand::New(name) => {
                let created = self.library.create(&name)?;
                println!("created playlist {} ({})", created.name, created.id);
            }
            PlaylistCommand::Remove(id) => {
                let removed = self.library.delete(id)?;
                println!("deleted playlist {}", removed.name);
            }
            PlaylistCommand::Rename(id, name) => self.library.rename(id, &name)?,
            PlaylistCommand::Cover(id, cover) => self.library.set_cover(id, cover)?,
            PlaylistCommand::Add(id, n) => {
                let track = self.results.get(n).cloned().ok_or_else(|| {
                    PlayerError::invalid(format!("no search result {}", n + 1))
                })?;
                let title = track.title.clone();
                if self.library.add_track(id, track)? {
                    println!("added {title}");
                } else {
                    println!("{title} is already in the playlist");
                }
            }
            PlaylistCommand::Move(id, from, to) => self.library.reorder(id, from, to)?,
            PlaylistCommand::Play(id, start) => {
                let tracks = self
                    .library
                    .get(id)
                    .ok_or(PlayerError::PlaylistNotFound(id))?
                    .tracks
                    .clone();
                let update = self.session.load_queue(tracks, start).await?;
                self.report(update);
            }
        }
        Ok(())
    }

    fn toggle_video(&mut self) -> PlayerResult<()> {
        self.settings.show_video = !self.settings.show_video;
        write_settings(self.library.local(), &self.settings)
            .map_err(|err| PlayerError::Storage(format!("{err:#}")))?;
        println!("video {}", if self.settings.show_video { "on" } else { "off" });
        if self.settings.show_video {
            if let Some(track) = self.session.controller().current_track() {
                let position = self.session.controller().state().current_time;
                println!("  {}", urls::embed_url(&track.id, position, true));
            }
        }
        Ok(())
    }

    fn print_status(&self) {
        let controller = self.session.controller();
        let Some(track) = controller.current_track() else {
            println!("nothing queued");
            return;
        };
        let state = controller.state();
        println!("{} - {}", track.display_artist(), track.title);
        println!(
            "  {:?}  {} / {} ({:.0}%)  vol {}  shuffle {}",
            controller.phase(),
            format_clock(state.current_time),
            format_clock(state.duration),
            state.progress() * 100.0,
            state.volume,
            if controller.queue().shuffle() { "on" } else { "off" },
        );
        if let Some(index) = controller.queue().index() {
            println!("  queue {}/{}", index + 1, controller.queue().len());
        }
        println!("  stream: {}", urls::stream_url(self.catalog.api().base(), &track.id));
        println!(
            "  transport: {}{}",
            self.session.adapter_name(),
            if self.session.is_polling() { " (polling)" } else { "" }
        );
    }

    fn report(&mut self, update: SessionUpdate) {
        if let Some(track) = update.track_changed {
            self.track_changed(track);
        }
        if let Some(err) = update.error {
            report_error(&err);
        }
    }

    fn track_changed(&mut self, track: Track) {
        println!("> {} - {}", track.display_artist(), track.title);
        if self.settings.show_video {
            println!("  {}", urls::embed_url(&track.id, 0.0, true));
        }

        let token = self.details_gate.begin();
        let catalog = self.catalog.clone();
        let details = self.outbox.details.clone();
        tokio::spawn(async move {
            let found = catalog.artist_details(&track.title).await;
            details.send((token, found)).ok();
        });
    }
}

fn report_error(err: &PlayerError) {
    if err.is_recoverable() {
        warn!(error = %err, "command failed");
        println!("error: {err}");
    } else {
        println!("{err}");
    }
}
