//! Scrollplay entry point.
//!
//! On wasm32 this boots the playlist on the live page. Elsewhere it runs the same
//! playlist against a simulated card feed driven from stdin, which is handy for
//! trying key bindings and configuration files without a browser.
//!
//! # Browser
//!
//! 1. **Load**: read the optional `scrollplay-config` JSON script tag
//! 2. **Trace**: install the console subscriber
//! 3. **Session**: wrap the page in a `WebDocument` and build the session
//! 4. **Listen**: a global `keydown` listener forwards every key name
//!
//! # Simulator
//!
//! ```text
//! $ scrollplay --cards 3 --page-size 5
//! start: index=Some(0) playing=None cards=3
//! ArrowRight
//! ArrowRight: index=Some(1) playing=Some(1) cards=3
//! play 7
//! play 7: index=Some(6) playing=Some(6) cards=8
//! ```
//!
//! Each stdin line is a key name (`ArrowRight`, `j`, ...), `play <n>` or
//! `click <n>`. Pending loads are settled after every line.

#![allow(clippy::multiple_crate_versions)]

#[cfg(target_arch = "wasm32")]
fn main() {
    browser::start();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> scrollplay::Result<()> {
    simulator::run()
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use scrollplay::dom::web::{BrowserSpawner, WebDocument};
    use scrollplay::observability::init_tracing;
    use scrollplay::{initialize, Config, Result, Session};
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    const CONFIG_ELEMENT_ID: &str = "scrollplay-config";

    pub fn start() {
        let Some(document) = WebDocument::from_window() else {
            return;
        };

        let loaded = read_config(document.raw());
        let config = loaded.as_ref().ok().cloned().unwrap_or_default();
        init_tracing(&config);
        if let Err(err) = &loaded {
            tracing::warn!(error = %err, "invalid {CONFIG_ELEMENT_ID}, using defaults");
        }

        match initialize(Rc::new(document), Rc::new(BrowserSpawner), config) {
            Ok(session) => install_key_listener(session),
            Err(err) => tracing::error!(error = %err, "scrollplay failed to start"),
        }
    }

    fn read_config(document: &web_sys::Document) -> Result<Config> {
        let Some(script) = document.get_element_by_id(CONFIG_ELEMENT_ID) else {
            return Ok(Config::default());
        };
        let text = script.text_content().unwrap_or_default();
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Config::from_json_str(&text)
    }

    fn install_key_listener(session: Session<WebDocument>) {
        let target = session.document().raw().clone();

        let on_key = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let key = event.key();
            if let Some(command) = session.handle_key(&key) {
                tracing::trace!(key, ?command, "key handled");
            }
        }) as Box<dyn FnMut(KeyboardEvent)>);

        if let Err(err) =
            target.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())
        {
            tracing::error!(error = ?err, "could not listen for keys");
            return;
        }
        on_key.forget();
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod simulator {
    use clap::Parser;
    use futures::executor::LocalPool;
    use scrollplay::dom::feed::FeedSimulator;
    use scrollplay::dom::memory::MemoryDocument;
    use scrollplay::observability::init_tracing;
    use scrollplay::{initialize, Config, Result, Session};
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Upper bound on load rounds per input line; a capped feed never satisfies a
    /// jump past its end.
    const MAX_SETTLE_ROUNDS: usize = 64;

    /// Drive a playlist over a simulated card feed from stdin.
    #[derive(Debug, Parser)]
    #[command(name = "scrollplay", version, about)]
    struct Cli {
        /// Cards rendered before the first load.
        #[arg(long, default_value_t = 5)]
        cards: usize,

        /// Cards appended by each load.
        #[arg(long, default_value_t = 5)]
        page_size: usize,

        /// Stop producing cards after this many.
        #[arg(long)]
        limit: Option<usize>,

        /// TOML (or `.json`) configuration file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tracing filter, overrides the configuration file.
        #[arg(long)]
        trace_level: Option<String>,
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if cli.trace_level.is_some() {
            config.trace_level.clone_from(&cli.trace_level);
        }
        init_tracing(&config);

        let document = Rc::new(MemoryDocument::new());
        let mut feed = FeedSimulator::new(Rc::clone(&document), cli.cards, cli.page_size);
        if let Some(limit) = cli.limit {
            feed = feed.with_limit(limit);
        }
        let mut pool = LocalPool::new();
        let session = initialize(document, Rc::new(pool.spawner()), config)?;

        let mut out = io::stdout().lock();
        report(&mut out, "start", &session, &feed)?;

        for line in io::stdin().lock().lines() {
            let line = line?;
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            apply(input, &session, &feed);
            settle(&feed, &mut pool);
            report(&mut out, input, &session, &feed)?;
        }
        Ok(())
    }

    fn apply(input: &str, session: &Session<MemoryDocument>, feed: &FeedSimulator) {
        let (verb, argument) = input.split_once(' ').unwrap_or((input, ""));
        let position = argument.trim().parse::<usize>();

        match (verb, position) {
            ("play", Ok(index)) => session.player().play(index),
            ("click", Ok(position)) => feed.click_card(position),
            _ => {
                if session.handle_key(input).is_none() {
                    tracing::info!(input, "unbound key");
                }
            }
        }
    }

    fn settle(feed: &FeedSimulator, pool: &mut LocalPool) {
        pool.run_until_stalled();
        for _ in 0..MAX_SETTLE_ROUNDS {
            if !feed.is_busy() {
                return;
            }
            feed.settle();
            pool.run_until_stalled();
        }
        tracing::warn!(rounds = MAX_SETTLE_ROUNDS, "feed still loading, giving up");
    }

    fn report(
        out: &mut impl Write,
        label: &str,
        session: &Session<MemoryDocument>,
        feed: &FeedSimulator,
    ) -> Result<()> {
        let player = session.player();
        writeln!(
            out,
            "{label}: index={:?} playing={:?} cards={}",
            player.current_index(),
            feed.now_playing(),
            player.len()
        )?;
        Ok(())
    }
}
