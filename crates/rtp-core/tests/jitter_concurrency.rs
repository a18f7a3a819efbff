//! Producer and consumer on separate threads sharing one buffer

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tmedia_rtp_core::buffer::{BufferListener, JitterBuffer, JitterBufferConfig};
use tmedia_rtp_core::packet::RtpPacketRecord;

struct FillCounter(AtomicUsize);

impl BufferListener for FillCounter {
    fn on_fill(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Listener that calls back into the buffer; must not deadlock
struct Reentrant {
    buffer: Arc<JitterBuffer>,
    seen: AtomicUsize,
}

impl BufferListener for Reentrant {
    fn on_fill(&self) {
        self.seen.store(self.buffer.available(), Ordering::SeqCst);
    }
}

#[test]
fn test_concurrent_writer_and_reader_preserve_order() {
    let jitter = Arc::new(JitterBuffer::new(JitterBufferConfig::new(64, 40)).unwrap());
    let counter = Arc::new(FillCounter(AtomicUsize::new(0)));
    jitter.set_listener(counter.clone());

    let done = Arc::new(AtomicBool::new(false));
    const TOTAL: u32 = 5000;
    // Start near the wrap so the run crosses it
    const FIRST: u16 = 63000;

    let producer = {
        let jitter = jitter.clone();
        let done = done.clone();
        thread::spawn(move || {
            for i in 0..TOTAL {
                let seq = FIRST.wrapping_add(i as u16);
                jitter.write(RtpPacketRecord::from_slice(seq, i * 160, &i.to_be_bytes()));
                if i % 64 == 0 {
                    thread::yield_now();
                }
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let consumer = {
        let jitter = jitter.clone();
        let done = done.clone();
        thread::spawn(move || {
            let mut played: Vec<u32> = Vec::new();
            let mut now = 0u64;
            loop {
                match jitter.read(now) {
                    Some(record) => {
                        let mut index = [0u8; 4];
                        index.copy_from_slice(record.payload());
                        played.push(u32::from_be_bytes(index));
                    }
                    // A tail shorter than the jitter depth is never released
                    None if done.load(Ordering::SeqCst) => break,
                    None => thread::sleep(Duration::from_micros(50)),
                }
                now += 1;
            }
            played
        })
    };

    producer.join().unwrap();
    let played = consumer.join().unwrap();

    assert!(!played.is_empty());
    assert!(played.windows(2).all(|w| w[0] < w[1]), "playout out of order");

    let stats = jitter.stats();
    assert_eq!(stats.packets_played as usize, played.len());
    assert_eq!(stats.packets_lost, 0);
    assert_eq!(
        stats.packets_played + stats.packets_overflow + stats.buffered_packets as u64,
        TOTAL as u64
    );
    assert!(counter.0.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_listener_may_use_buffer() {
    let jitter = Arc::new(JitterBuffer::new(JitterBufferConfig::default()).unwrap());
    let listener = Arc::new(Reentrant {
        buffer: jitter.clone(),
        seen: AtomicUsize::new(0),
    });
    jitter.set_listener(listener.clone());

    for seq in 1..=4u16 {
        jitter.write(RtpPacketRecord::from_slice(seq, seq as u32 * 160, b"x"));
    }
    assert_eq!(listener.seen.load(Ordering::SeqCst), 4);
}
