use futures::executor::LocalPool;
use scrollplay::dom::feed::FeedSimulator;
use scrollplay::dom::memory::MemoryDocument;
use scrollplay::{initialize, Command, Config, KeyBindings, Session};
use std::rc::Rc;

struct Page {
    feed: FeedSimulator,
    pool: LocalPool,
    session: Session<MemoryDocument>,
}

impl Page {
    fn new(initial: usize, page_size: usize) -> Self {
        Self::with_config(initial, page_size, Config::default())
    }

    fn with_config(initial: usize, page_size: usize, config: Config) -> Self {
        let document = Rc::new(MemoryDocument::new());
        let feed = FeedSimulator::new(Rc::clone(&document), initial, page_size);
        let pool = LocalPool::new();
        let session =
            initialize(document, Rc::new(pool.spawner()), config).expect("valid config");
        Self {
            feed,
            pool,
            session,
        }
    }

    fn press(&mut self, key: &str) -> Option<Command> {
        let command = self.session.handle_key(key);
        self.pool.run_until_stalled();
        command
    }

    fn finish_loading(&mut self) {
        while self.feed.is_busy() {
            self.feed.settle();
            self.pool.run_until_stalled();
        }
    }

    fn index(&self) -> Option<usize> {
        self.session.player().current_index()
    }

    fn len(&self) -> usize {
        self.session.player().len()
    }
}

#[test]
fn arrow_keys_walk_the_playlist_and_extend_it() {
    let mut page = Page::new(3, 2);

    assert_eq!(page.press("ArrowDown"), Some(Command::TogglePlayback));
    assert_eq!(page.feed.now_playing(), Some(0));

    page.press("ArrowRight");
    assert_eq!(page.index(), Some(1));
    assert!(!page.feed.is_busy());

    page.press("ArrowRight");
    assert_eq!(page.index(), Some(2));
    assert!(page.feed.is_busy());
    assert_eq!(page.feed.now_playing(), Some(2));

    page.finish_loading();
    assert_eq!(page.len(), 5);

    page.press("ArrowRight");
    page.press("ArrowRight");
    assert_eq!(page.index(), Some(4));
    assert!(page.feed.is_busy());

    page.press("ArrowLeft");
    assert_eq!(page.index(), Some(3));
    assert_eq!(page.feed.now_playing(), Some(3));
}

#[test]
fn repeated_next_at_the_end_while_loading_clicks_once_per_press() {
    let mut page = Page::new(2, 2);
    page.press("ArrowRight");
    page.press("ArrowRight");
    page.press("ArrowRight");

    let button = page.feed.load_more_button();
    let clicks = page
        .feed
        .document()
        .click_log()
        .iter()
        .filter(|node| **node == button)
        .count();
    assert_eq!(clicks, 3);
    assert_eq!(page.index(), Some(1));

    page.finish_loading();
    assert_eq!(page.len(), 4);
}

#[test]
fn jump_past_the_rendered_cards_loads_first() {
    let mut page = Page::new(3, 5);
    page.session.player().play(7);
    assert_eq!(page.index(), Some(0));
    assert_eq!(page.feed.now_playing(), None);

    page.finish_loading();
    assert_eq!(page.len(), 8);
    assert_eq!(page.index(), Some(6));
    assert_eq!(page.feed.now_playing(), Some(6));
}

#[test]
fn load_more_key_loads_without_moving() {
    let mut page = Page::new(2, 3);
    page.press("ArrowRight");
    page.finish_loading();

    assert_eq!(page.press("ArrowUp"), Some(Command::LoadMore));
    page.finish_loading();
    assert_eq!(page.len(), 8);
    assert_eq!(page.index(), Some(1));
}

#[test]
fn user_clicks_keep_the_cursor_in_sync() {
    let mut page = Page::new(4, 2);
    page.feed.click_card(2);
    assert_eq!(page.index(), Some(2));

    page.press("ArrowRight");
    assert_eq!(page.index(), Some(3));
    assert_eq!(page.feed.now_playing(), Some(3));
}

#[test]
fn placeholders_are_not_part_of_the_playlist() {
    let mut page = Page::new(2, 2);
    page.feed.push_placeholder();
    page.press("ArrowUp");
    page.finish_loading();
    assert_eq!(page.len(), 4);

    page.press("ArrowRight");
    page.press("ArrowRight");
    assert_eq!(page.index(), Some(2));
    assert_eq!(page.feed.now_playing(), Some(2));
}

#[test]
fn custom_bindings_and_selectors() {
    let config = Config {
        keys: KeyBindings {
            next: "j".to_string(),
            previous: "k".to_string(),
            ..KeyBindings::default()
        },
        card_selector: "div.card".to_string(),
        ..Config::default()
    };
    let mut page = Page::with_config(3, 1, config);
    assert_eq!(page.press("ArrowRight"), None);
    assert_eq!(page.press("j"), Some(Command::Next));
    assert_eq!(page.index(), Some(1));
    assert_eq!(page.press("k"), Some(Command::Previous));
    assert_eq!(page.index(), Some(0));
}

#[test]
fn capped_feed_stops_growing() {
    let document = Rc::new(MemoryDocument::new());
    let feed = FeedSimulator::new(Rc::clone(&document), 2, 2).with_limit(3);
    let mut pool = LocalPool::new();
    let session = initialize(document, Rc::new(pool.spawner()), Config::default())
        .expect("valid config");

    session.handle_key("ArrowRight");
    feed.settle();
    pool.run_until_stalled();
    assert_eq!(session.player().len(), 3);

    session.handle_key("ArrowRight");
    session.handle_key("ArrowRight");
    feed.settle();
    pool.run_until_stalled();
    assert_eq!(session.player().len(), 3);
    assert_eq!(session.player().current_index(), Some(2));
}

#[test]
fn missing_load_button_leaves_navigation_working() {
    let config = Config {
        load_more_selector: "#nowhere".to_string(),
        ..Config::default()
    };
    let mut page = Page::with_config(2, 2, config);
    page.press("ArrowRight");
    page.press("ArrowUp");
    assert!(!page.feed.is_busy());
    assert_eq!(page.index(), Some(1));
    assert_eq!(page.feed.now_playing(), Some(1));
}
