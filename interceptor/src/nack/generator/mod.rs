use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use rtcp::transport_layer_nack::{nack_pairs_from_sequence_numbers, TransportLayerNack};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::UINT16SIZE_HALF;

/// How often the retry timer walks the lost set.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);
/// NACK attempts per lost packet before it is written off.
pub const DEFAULT_MAX_RETRIES: u8 = 3;
/// Losses tracked at once; the oldest are pruned beyond this.
const MAX_TRACKED_LOSSES: usize = 150;

/// Events surfaced by a NackGenerator.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NackEvent {
    /// Losses whose retry timers came due, packed into a feedback message
    /// ready to send to the peer.
    Nack(TransportLayerNack),
    /// A loss that exhausted its retries; it will not be asked for again.
    PacketPermanentlyLost(u16),
}

#[derive(Clone)]
pub struct GeneratorConfig {
    /// SSRC stamped as the sender of emitted feedback.
    pub sender_ssrc: u32,
    /// SSRC of the media stream whose gaps are tracked.
    pub media_ssrc: u32,
    /// Retry timer period.
    pub interval: Duration,
    /// NACK attempts per packet before giving up.
    pub max_retries: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            sender_ssrc: 0,
            media_ssrc: 0,
            interval: DEFAULT_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

struct LostPacket {
    sequence_number: u16,
    attempts: u8,
    retry_delay: Duration,
    next_retry: Instant,
}

#[derive(Default)]
struct GeneratorState {
    started: bool,
    highest_received: u16,
    lost_packets: Vec<LostPacket>,
}

impl GeneratorState {
    fn record(&mut self, seq: u16, interval: Duration) {
        if !self.started {
            self.started = true;
            self.highest_received = seq;
            return;
        }

        let diff = seq.wrapping_sub(self.highest_received);
        if diff == 0 {
            return;
        }

        if diff < UINT16SIZE_HALF {
            // seq advances the highest received; everything in between went
            // missing.
            let mut missing = self.highest_received.wrapping_add(1);
            while missing != seq {
                if self.lost_packets.len() >= MAX_TRACKED_LOSSES {
                    let dropped = self.lost_packets.remove(0);
                    warn!(
                        "lost set full, dropping oldest tracked loss {}",
                        dropped.sequence_number
                    );
                }
                self.lost_packets.push(LostPacket {
                    sequence_number: missing,
                    attempts: 0,
                    retry_delay: interval,
                    next_retry: Instant::now(),
                });
                missing = missing.wrapping_add(1);
            }
            self.highest_received = seq;
        } else if let Some(pos) = self
            .lost_packets
            .iter()
            .position(|lost| lost.sequence_number == seq)
        {
            // A tracked loss arrived after all; recovered.
            self.lost_packets.remove(pos);
        }
    }

    /// Walks the lost set: packets whose retry time elapsed go into one
    /// NACK and have their back-off doubled; packets out of retries are
    /// dropped and reported as permanently lost.
    fn collect_due(&mut self, now: Instant, max_retries: u8) -> (Vec<u16>, Vec<u16>) {
        let mut due = vec![];
        let mut expired = vec![];

        self.lost_packets.retain_mut(|lost| {
            if now < lost.next_retry {
                return true;
            }
            if lost.attempts >= max_retries {
                expired.push(lost.sequence_number);
                return false;
            }
            lost.attempts += 1;
            lost.retry_delay *= 2;
            lost.next_retry = now + lost.retry_delay;
            due.push(lost.sequence_number);
            true
        });

        (due, expired)
    }
}

/// NackGenerator watches the sequence numbers of received media, emits
/// generic NACKs for the gaps, retries each with doubling back-off, and
/// reports packets as permanently lost once retries run out.
///
/// Construction spawns the retry ticker, so a tokio runtime must be
/// current. Events are delivered on the returned channel until `close` is
/// awaited; nothing is emitted after it returns.
pub struct NackGenerator {
    config: GeneratorConfig,
    state: Arc<Mutex<GeneratorState>>,
    close_tx: Option<mpsc::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl NackGenerator {
    pub fn new(config: GeneratorConfig) -> (Self, mpsc::Receiver<NackEvent>) {
        let state = Arc::new(Mutex::new(GeneratorState::default()));
        let (event_tx, event_rx) = mpsc::channel(64);
        let (close_tx, mut close_rx) = mpsc::channel::<()>(1);

        let timer_state = Arc::clone(&state);
        let timer_config = config.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(timer_config.interval);
            loop {
                tokio::select! {
                    _ = close_rx.recv() => break,
                    now = ticker.tick() => {
                        let (due, expired) = {
                            let mut state = timer_state.lock().unwrap();
                            state.collect_due(now, timer_config.max_retries)
                        };

                        if !due.is_empty() {
                            let nack = TransportLayerNack {
                                sender_ssrc: timer_config.sender_ssrc,
                                media_ssrc: timer_config.media_ssrc,
                                nacks: nack_pairs_from_sequence_numbers(&due),
                            };
                            if event_tx.send(NackEvent::Nack(nack)).await.is_err() {
                                return;
                            }
                        }
                        for seq in expired {
                            debug!("packet {} permanently lost after retries", seq);
                            if event_tx
                                .send(NackEvent::PacketPermanentlyLost(seq))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                    }
                }
            }
        });

        (
            NackGenerator {
                config,
                state,
                close_tx: Some(close_tx),
                handle: Some(handle),
            },
            event_rx,
        )
    }

    /// Records a received media sequence number: gaps below it become
    /// tracked losses, and a tracked loss that shows up is recovered.
    pub fn on_packet(&self, seq: u16) {
        let mut state = self.state.lock().unwrap();
        state.record(seq, self.config.interval);
    }

    /// Sequence numbers currently tracked as lost, in detection order.
    pub fn lost_sequence_numbers(&self) -> Vec<u16> {
        let state = self.state.lock().unwrap();
        state
            .lost_packets
            .iter()
            .map(|lost| lost.sequence_number)
            .collect()
    }

    /// Stops the retry ticker. Pending NACKs are dropped and no further
    /// events are emitted once this returns.
    pub async fn close(&mut self) {
        self.close_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for NackGenerator {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
