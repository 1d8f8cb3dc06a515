//! Command dispatch.
//!
//! Key presses arrive as [`Command`]s from the [`InputRouter`](super::InputRouter) and
//! are applied here to the live [`PlaylistController`]. Every command is handled
//! synchronously; the only deferred work is the controller's wait for a load to
//! finish, which the gate schedules on its executor.

use super::keymap::Command;
use super::player::PlaylistController;
use crate::dom::Document;

/// Applies one command to the playlist.
///
/// # Tracing
///
/// Each call enters a debug-level span carrying the command and the cursor before the
/// command ran.
pub fn handle_command<D: Document>(player: &PlaylistController<D>, command: Command) {
    let _span = tracing::debug_span!(
        "handle_command",
        command = ?command,
        index = ?player.current_index(),
    )
    .entered();

    match command {
        Command::Next => player.next(),
        Command::Previous => player.prev(),
        Command::TogglePlayback => player.toggle_playback(),
        Command::LoadMore => {
            tracing::debug!(len = player.len(), "forcing load");
            player.load_more();
        }
    }

    tracing::debug!(index = ?player.current_index(), len = player.len(), "command handled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gate::LoadGate;
    use crate::app::player::CardSelectors;
    use crate::dom::feed::FeedSimulator;
    use crate::dom::memory::MemoryDocument;
    use futures::executor::LocalPool;
    use std::rc::Rc;

    #[test]
    fn commands_drive_the_playlist() {
        let document = Rc::new(MemoryDocument::new());
        let feed = FeedSimulator::new(Rc::clone(&document), 2, 2);
        let mut pool = LocalPool::new();
        let gate = Rc::new(LoadGate::new(
            Rc::clone(&document),
            Rc::new(pool.spawner()),
            "main button",
        ));
        let player = PlaylistController::new(
            Rc::clone(&document),
            CardSelectors::new("#cards-container > div", "[role=\"button\"]"),
            gate,
        );

        handle_command(&player, Command::TogglePlayback);
        assert_eq!(feed.now_playing(), Some(0));

        handle_command(&player, Command::Next);
        assert_eq!(player.current_index(), Some(1));
        assert!(feed.is_busy());

        feed.settle();
        pool.run_until_stalled();
        assert_eq!(player.len(), 4);

        handle_command(&player, Command::Previous);
        assert_eq!(player.current_index(), Some(0));
        assert_eq!(feed.now_playing(), Some(0));

        handle_command(&player, Command::LoadMore);
        feed.settle();
        pool.run_until_stalled();
        assert_eq!(player.len(), 6);
        assert_eq!(player.current_index(), Some(0));
    }
}
