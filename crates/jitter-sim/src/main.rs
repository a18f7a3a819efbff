//! Jitter buffer simulator
//!
//! Runs one RTP stream through a synthetic impaired network into a
//! [`JitterBuffer`] and plays it out on a fixed 20 ms tick, the way the
//! media server's receive path and mixer do. Prints the buffer statistics
//! when the stream ends.
//!
//! ```text
//! jitter-sim --packets 500 --loss 0.05 --jitter-ms 80 --first-seq 65300
//! RUST_LOG=tmedia_rtp_core=debug jitter-sim --config jitter.toml
//! ```

mod logging;
mod network;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use tmedia_rtp_core::buffer::{BufferListener, JitterBuffer, JitterBufferConfig, JitterBufferStats};
use tmedia_rtp_core::packet::{hex_dump, RtpPacket, RtpPacketRecord};

use network::{Delivery, NetworkProfile, SyntheticStream};

/// Consumer ticks with nothing to play before giving up after the sender stops
const DRAIN_TICKS: u32 = 25;

#[derive(Parser, Debug)]
#[command(name = "jitter-sim", version, about = "Simulate RTP playout through a jitter buffer")]
struct Args {
    /// TOML file with jitter buffer settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Buffer capacity in packets (overrides the config file)
    #[arg(long)]
    capacity: Option<usize>,

    /// Jitter depth in milliseconds (overrides the config file)
    #[arg(short = 'd', long)]
    depth_ms: Option<u32>,

    /// Release packets as soon as they arrive
    #[arg(long)]
    pass_through: bool,

    /// Number of packets the sender emits
    #[arg(short = 'n', long, default_value = "250")]
    packets: u32,

    /// First sequence number; start near 65535 to exercise wraparound
    #[arg(long, default_value = "65400")]
    first_seq: u16,

    /// Packet loss probability
    #[arg(long, default_value = "0.02")]
    loss: f64,

    /// Packet duplication probability
    #[arg(long, default_value = "0.01")]
    duplicate: f64,

    /// Fixed network delay in milliseconds
    #[arg(long, default_value = "30")]
    delay_ms: u64,

    /// Maximum random extra delay in milliseconds
    #[arg(short, long, default_value = "60")]
    jitter_ms: u64,

    /// Pause the sender every N packets (0 = never)
    #[arg(long, default_value = "0")]
    silence_every: u32,

    /// Length of each sender pause in milliseconds
    #[arg(long, default_value = "1000")]
    silence_ms: u32,

    /// Random seed for the network model
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn buffer_config(&self) -> Result<JitterBufferConfig> {
        let mut config = match &self.config {
            Some(path) => JitterBufferConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => JitterBufferConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(depth_ms) = self.depth_ms {
            config.jitter_depth_ms = depth_ms;
        }
        if self.pass_through {
            config.buffering = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn network_profile(&self) -> NetworkProfile {
        NetworkProfile {
            loss: self.loss,
            duplicate: self.duplicate,
            base_delay_ms: self.delay_ms,
            jitter_ms: self.jitter_ms,
            silence_every: self.silence_every,
            silence_ms: self.silence_ms,
        }
    }
}

/// Logs each transition into playout
struct FillLogger;

impl BufferListener for FillLogger {
    fn on_fill(&self) {
        info!("jitter buffer filled, playout running");
    }
}

#[derive(Debug, Default, Serialize)]
struct PlayoutReport {
    packets_sent: u32,
    datagrams_delivered: usize,
    ticks: u64,
    empty_ticks: u64,
    media_played_ms: u64,
    drift_ms: i64,
    buffer: JitterBufferStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(&args.log_level, false)?;

    let config = args.buffer_config()?;
    let profile = args.network_profile();
    info!(?config, "starting jitter simulation");
    debug!(?profile, "network profile");

    let mut stream = SyntheticStream::new(
        args.first_seq,
        config.clock_rate,
        config.packet_duration_ms,
        args.seed,
    );
    let deliveries = stream.schedule(args.packets, &profile)?;
    info!(
        sent = args.packets,
        delivered = deliveries.len(),
        "network schedule prepared"
    );

    let jitter = Arc::new(JitterBuffer::new(config.clone())?);
    jitter.set_listener(Arc::new(FillLogger));

    let start = Instant::now();
    let sender_done = Arc::new(AtomicBool::new(false));

    let datagrams_delivered = deliveries.len();
    let producer = tokio::spawn(run_receiver(
        jitter.clone(),
        deliveries,
        start,
        sender_done.clone(),
    ));
    let consumer = tokio::spawn(run_playout(
        jitter.clone(),
        config.packet_duration_ms,
        start,
        sender_done,
    ));

    producer.await.context("receiver task panicked")??;
    let mut report = consumer.await.context("playout task panicked")?;

    report.packets_sent = args.packets;
    report.datagrams_delivered = datagrams_delivered;
    report.drift_ms = jitter.drift_ms();
    report.buffer = jitter.stats();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Network receive path: parse each datagram when it arrives and hand it to the buffer
async fn run_receiver(
    jitter: Arc<JitterBuffer>,
    deliveries: Vec<Delivery>,
    start: Instant,
    done: Arc<AtomicBool>,
) -> Result<()> {
    for delivery in deliveries {
        time::sleep_until(start + Duration::from_millis(delivery.at_ms)).await;

        let packet = match RtpPacket::parse(&delivery.datagram) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("dropping malformed datagram: {}", e);
                continue;
            }
        };
        trace!(
            seq = packet.header.sequence_number,
            ts = packet.header.timestamp,
            "rx [{}]",
            hex_dump(&delivery.datagram[..packet.header.size()])
        );

        let arrival_ms = start.elapsed().as_millis() as u64;
        jitter.write_at(RtpPacketRecord::from(packet), arrival_ms);
    }

    done.store(true, Ordering::SeqCst);
    debug!("receiver finished");
    Ok(())
}

/// Mixer side: one read per tick, never waiting on the buffer
async fn run_playout(
    jitter: Arc<JitterBuffer>,
    packet_duration_ms: u32,
    start: Instant,
    sender_done: Arc<AtomicBool>,
) -> PlayoutReport {
    let mut report = PlayoutReport::default();
    let mut ticker = time::interval(Duration::from_millis(packet_duration_ms as u64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut idle_after_done = 0;

    loop {
        ticker.tick().await;
        report.ticks += 1;
        let now_ms = start.elapsed().as_millis() as u64;

        match jitter.read(now_ms) {
            Some(record) => {
                trace!(
                    seq = record.sequence_number(),
                    duration = record.duration_ms(),
                    "play"
                );
                report.media_played_ms += record.duration_ms();
                idle_after_done = 0;
            }
            None => {
                report.empty_ticks += 1;
                if sender_done.load(Ordering::SeqCst) {
                    idle_after_done += 1;
                    if idle_after_done >= DRAIN_TICKS {
                        break;
                    }
                }
            }
        }
    }

    debug!(ticks = report.ticks, "playout finished");
    report
}

fn print_report(report: &PlayoutReport) {
    let stats = &report.buffer;
    println!("Jitter simulation results");
    println!("  sent / delivered     : {} / {}", report.packets_sent, report.datagrams_delivered);
    println!("  ticks (empty)        : {} ({})", report.ticks, report.empty_ticks);
    println!("  media played         : {} ms", report.media_played_ms);
    println!("  playout drift        : {} ms", report.drift_ms);
    println!("  played               : {}", stats.packets_played);
    println!("  lost                 : {}", stats.packets_lost);
    println!("  duplicates           : {}", stats.duplicates);
    println!("  too late             : {}", stats.packets_too_late);
    println!("  overflow evictions   : {}", stats.packets_overflow);
    println!("  silence gaps         : {}", stats.silence_gaps);
    println!("  underruns            : {}", stats.underruns);
    println!("  outliers / resyncs   : {} / {}", stats.outliers, stats.resyncs);
    println!("  sequence cycles      : {}", stats.sequence_cycles);
    println!("  interarrival jitter  : {} units ({:.2} ms)", stats.jitter, stats.jitter_ms);
}
