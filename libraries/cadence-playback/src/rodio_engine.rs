//! Audio engine backed by rodio
//!
//! rodio's output stream must stay on the thread that opened it, so a
//! dedicated audio thread owns the stream and the sink. `RodioEngine` talks
//! to it over a command channel. The thread is started on the first `open`,
//! which means no audio device is touched until something is played.

use crate::{
    engine::{AudioEngine, EngineEvent, EngineEventSender},
    error::{PlaybackError, Result},
    types::{AudioResource, ResourceToken},
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How often the audio thread checks whether the sink has drained
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long callers wait for the audio thread to answer
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Open {
        path: PathBuf,
        duration: Duration,
        token: ResourceToken,
        reply: Sender<Result<()>>,
    },
    Play,
    Pause,
    Release,
    Seek {
        position: Duration,
        reply: Sender<Result<()>>,
    },
    SetVolume(f32),
    Position {
        reply: Sender<Duration>,
    },
}

/// rodio-backed `AudioEngine`
pub struct RodioEngine {
    events: EngineEventSender,
    commands: Option<Sender<Command>>,
    loaded: bool,
    duration: Duration,
}

impl RodioEngine {
    pub fn new(events: EngineEventSender) -> Self {
        Self {
            events,
            commands: None,
            loaded: false,
            duration: Duration::ZERO,
        }
    }

    /// Command channel to the audio thread, starting it if needed
    fn commands(&mut self) -> Result<&Sender<Command>> {
        if self.commands.is_none() {
            let commands = spawn_audio_thread(self.events.clone())?;
            self.commands = Some(commands);
        }
        self.commands
            .as_ref()
            .ok_or_else(|| PlaybackError::engine("audio thread unavailable"))
    }

    fn send(&self, command: Command) -> Result<()> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| PlaybackError::engine("audio thread not started"))?;
        commands
            .send(command)
            .map_err(|_| PlaybackError::engine("audio thread stopped"))
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(make(reply_tx))?;
        reply_rx
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| PlaybackError::engine("audio thread did not respond"))
    }
}

impl AudioEngine for RodioEngine {
    fn open(&mut self, resource: &AudioResource, token: ResourceToken) -> Result<()> {
        self.commands()?;

        let path = resource.path.clone();
        let duration = resource.duration;
        self.request(|reply| Command::Open {
            path,
            duration,
            token,
            reply,
        })??;

        self.loaded = true;
        self.duration = resource.duration;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.send(Command::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.send(Command::Pause)
    }

    fn release(&mut self) {
        if !self.loaded {
            return;
        }
        if let Err(e) = self.send(Command::Release) {
            tracing::warn!(error = %e, "Failed to release audio resource");
        }
        self.loaded = false;
        self.duration = Duration::ZERO;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.request(|reply| Command::Seek { position, reply })?
    }

    fn position(&self) -> Duration {
        if !self.loaded {
            return Duration::ZERO;
        }
        self.request(|reply| Command::Position { reply })
            .unwrap_or(Duration::ZERO)
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.send(Command::SetVolume(volume.clamp(0.0, 1.0)))
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Start the audio thread and wait until the output device is open
fn spawn_audio_thread(events: EngineEventSender) -> Result<Sender<Command>> {
    let (command_tx, command_rx) = bounded::<Command>(32);
    let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

    thread::Builder::new()
        .name("cadence-audio".to_string())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(PlaybackError::engine(format!(
                        "no audio output device: {e}"
                    ))));
                    return;
                }
            };
            stream.log_on_drop(false);
            let _ = ready_tx.send(Ok(()));

            tracing::info!("Audio output opened");
            AudioThread::new(stream, events).run(command_rx);
            tracing::info!("Audio thread finished");
        })
        .map_err(|e| PlaybackError::engine(format!("failed to spawn audio thread: {e}")))?;

    ready_rx
        .recv_timeout(REPLY_TIMEOUT)
        .map_err(|_| PlaybackError::engine("audio thread did not start"))??;

    Ok(command_tx)
}

/// Decode `path` into a paused sink positioned at `start_at`
fn create_sink_at(stream: &OutputStream, path: &Path, start_at: Duration) -> Result<Sink> {
    let file = File::open(path)
        .map_err(|e| PlaybackError::engine(format!("failed to open {}: {e}", path.display())))?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| PlaybackError::engine(format!("failed to decode {}: {e}", path.display())))?
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

/// Resource currently in the sink
struct Current {
    path: PathBuf,
    duration: Duration,
    token: ResourceToken,
    sink: Sink,

    // Position bookkeeping: time played before the last resume plus the
    // time since it.
    accumulated: Duration,
    started_at: Option<Instant>,

    ended: bool,
}

impl Current {
    fn position(&self) -> Duration {
        let elapsed = self.accumulated + self.started_at.map_or(Duration::ZERO, |s| s.elapsed());
        if self.duration.is_zero() {
            elapsed
        } else {
            elapsed.min(self.duration)
        }
    }

    fn paused(&self) -> bool {
        self.started_at.is_none()
    }
}

struct AudioThread {
    stream: OutputStream,
    events: EngineEventSender,
    current: Option<Current>,
    volume: f32,
}

impl AudioThread {
    fn new(stream: OutputStream, events: EngineEventSender) -> Self {
        Self {
            stream,
            events,
            current: None,
            volume: 1.0,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        loop {
            match commands.recv_timeout(POLL_INTERVAL) {
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.check_finished();
        }

        if let Some(current) = self.current.take() {
            current.sink.stop();
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Open {
                path,
                duration,
                token,
                reply,
            } => {
                let _ = reply.send(self.open(path, duration, token));
            }
            Command::Play => {
                if let Some(current) = self.current.as_mut() {
                    if current.paused() {
                        current.sink.play();
                        current.started_at = Some(Instant::now());
                    }
                }
            }
            Command::Pause => {
                if let Some(current) = self.current.as_mut() {
                    if let Some(started_at) = current.started_at.take() {
                        current.sink.pause();
                        current.accumulated += started_at.elapsed();
                    }
                }
            }
            Command::Release => {
                if let Some(current) = self.current.take() {
                    current.sink.stop();
                    tracing::debug!(token = ?current.token, "Sink released");
                }
            }
            Command::Seek { position, reply } => {
                let _ = reply.send(self.seek(position));
            }
            Command::SetVolume(volume) => {
                self.volume = volume;
                if let Some(current) = &self.current {
                    current.sink.set_volume(volume);
                }
            }
            Command::Position { reply } => {
                let position = self
                    .current
                    .as_ref()
                    .map_or(Duration::ZERO, Current::position);
                let _ = reply.send(position);
            }
        }
    }

    fn open(&mut self, path: PathBuf, duration: Duration, token: ResourceToken) -> Result<()> {
        if let Some(previous) = self.current.take() {
            tracing::warn!(token = ?previous.token, "Open without release, dropping previous sink");
            previous.sink.stop();
        }

        let sink = create_sink_at(&self.stream, &path, Duration::ZERO)?;
        sink.set_volume(self.volume);

        self.current = Some(Current {
            path,
            duration,
            token,
            sink,
            accumulated: Duration::ZERO,
            started_at: None,
            ended: false,
        });
        Ok(())
    }

    /// Rebuild the sink and skip into the file
    fn seek(&mut self, position: Duration) -> Result<()> {
        let Some(current) = self.current.as_mut() else {
            return Err(PlaybackError::nothing_playing());
        };

        let sink = create_sink_at(&self.stream, &current.path, position)?;
        sink.set_volume(self.volume);

        let was_paused = current.paused();
        current.sink.stop();
        current.sink = sink;
        current.accumulated = position;
        current.ended = false;
        if was_paused {
            current.started_at = None;
        } else {
            current.sink.play();
            current.started_at = Some(Instant::now());
        }
        Ok(())
    }

    /// Report a drained sink once
    fn check_finished(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if current.ended || current.paused() || !current.sink.empty() {
            return;
        }

        current.ended = true;
        current.accumulated = current.position();
        current.started_at = None;

        if self
            .events
            .send(EngineEvent::TrackEnded {
                token: current.token,
            })
            .is_err()
        {
            tracing::debug!("No listener for end-of-track event");
        }
    }
}
