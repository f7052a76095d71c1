//! Playback of transcript audio through an external player.
//!
//! Candidate answers are written to temporary WAV files; interviewer prompts are
//! streamed from their backend URL. Each transcript turn has at most one player
//! process, and playing a turn again stops it.

use crate::capture::AudioClip;
use crate::interview::AudioRef;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

/// An external player: binary, quiet headless arguments, and whether it can open URLs.
type PlayerSpec = (&'static str, &'static [&'static str], bool);

/// Players tried in order.
#[cfg(target_os = "macos")]
const PLAYERS: &[PlayerSpec] = &[
    ("afplay", &[], false),
    ("mpv", &["--no-video", "--really-quiet"], true),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"], true),
];

#[cfg(not(target_os = "macos"))]
const PLAYERS: &[PlayerSpec] = &[
    ("mpv", &["--no-video", "--really-quiet"], true),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"], true),
    ("vlc", &["--intf", "dummy", "--play-and-exit"], true),
    ("paplay", &[], false),
];

/// Players able to open `audio`; remote prompts need one that streams URLs.
fn players_for(audio: &AudioRef) -> impl Iterator<Item = &'static PlayerSpec> {
    let remote = matches!(audio, AudioRef::Remote(_));
    PLAYERS.iter().filter(move |(_, _, streams)| *streams || !remote)
}

/// Tracks one playback process per transcript turn.
///
/// Local clips live in a private temporary directory that is removed together
/// with the player.
#[derive(Default)]
pub struct Player {
    clips: Option<TempDir>,
    playing: HashMap<usize, Child>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts playback of turn `index`, or stops it if it is already playing.
    ///
    /// Returns whether the turn is playing afterwards.
    pub fn toggle(&mut self, index: usize, audio: &AudioRef) -> anyhow::Result<bool> {
        self.reap();
        if let Some(mut child) = self.playing.remove(&index) {
            tracing::debug!("Stopping playback of turn {}", index);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(false);
        }
        self.play(index, audio)?;
        Ok(true)
    }

    /// Starts playback of turn `index` unless it is already playing.
    pub fn play(&mut self, index: usize, audio: &AudioRef) -> anyhow::Result<()> {
        self.reap();
        if self.playing.contains_key(&index) {
            return Ok(());
        }

        let source: OsString = match audio {
            AudioRef::Local(clip) => self.write_clip(index, clip)?.into_os_string(),
            AudioRef::Remote(url) => url.into(),
        };

        let child = spawn_player(audio, &source)?;
        tracing::info!("Playing audio for turn {}", index);
        self.playing.insert(index, child);
        Ok(())
    }

    /// Forgets players that have finished on their own.
    pub fn reap(&mut self) {
        self.playing
            .retain(|_, child| matches!(child.try_wait(), Ok(None)));
    }

    /// Transcript indices currently playing, in ascending order.
    pub fn playing(&mut self) -> Vec<usize> {
        self.reap();
        let mut indices: Vec<usize> = self.playing.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn stop_all(&mut self) {
        for (_, mut child) in self.playing.drain() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    /// Writes a turn's clip to the player's directory, creating it on first use.
    fn write_clip(&mut self, index: usize, clip: &AudioClip) -> anyhow::Result<PathBuf> {
        let dir = match &mut self.clips {
            Some(dir) => dir,
            slot => slot.insert(
                tempfile::Builder::new()
                    .prefix("viva-")
                    .tempdir()
                    .map_err(|e| anyhow::anyhow!("Failed to create audio directory: {e}"))?,
            ),
        };

        let path = dir.path().join(format!("answer-{index}.wav"));
        fs::write(&path, clip.wav_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to write audio to {}: {e}", path.display()))?;
        Ok(path)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // players must exit before their files are removed
        self.stop_all();
    }
}

fn spawn_player(audio: &AudioRef, source: &OsString) -> anyhow::Result<Child> {
    for (player, args, _) in players_for(audio) {
        let spawned = Command::new(player)
            .args(*args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => return Ok(child),
            Err(e) => tracing::debug!("Audio player {} unavailable: {}", player, e),
        }
    }

    let names: Vec<&str> = players_for(audio).map(|(name, _, _)| *name).collect();
    Err(anyhow::anyhow!(
        "No audio player found. Install one of: {}",
        names.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn clip() -> Arc<AudioClip> {
        Arc::new(AudioClip::from_samples(&[0, 800, -800, 0], 16_000).unwrap())
    }

    #[test]
    fn clips_are_removed_with_the_player() {
        let mut player = Player::new();

        let first = player.write_clip(1, &clip()).unwrap();
        let second = player.write_clip(2, &clip()).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("wav"));

        drop(player);
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn remote_audio_skips_file_only_players() {
        let remote = AudioRef::Remote("https://vtb-aihr.ru/api/file/1/q.mp3".into());
        assert!(players_for(&remote).all(|(_, _, streams)| *streams));
        assert!(players_for(&remote).all(|(name, _, _)| *name != "paplay"));

        let local = AudioRef::Local(clip());
        assert_eq!(players_for(&local).count(), PLAYERS.len());
    }

    #[test]
    fn nothing_is_playing_initially() {
        let mut player = Player::new();
        assert!(player.playing().is_empty());
        player.stop_all();
    }
}
