//! progress — статус долгого реплея: процент, скорость, оценка остатка.
//!
//! Две независимые частоты, каждая со своим счётчиком срабатываний, чтобы
//! любая могла сработать без двойного репорта:
//! - раз в total/100 прочитанных байт;
//! - раз в BLOCK_REPORT_INTERVAL блоков.
//!
//! ETA = elapsed * (1 - fraction) / fraction; при fraction == 0 оценки нет
//! (никакого деления на ноль). Процент зажат в [0, 100].

use std::time::Instant;

/// Репорт раз в столько блоков (вторая частота).
pub const BLOCK_REPORT_INTERVAL: u32 = 10_000;

pub struct ProgressReporter {
    total_bytes: u64,
    start: Instant,

    byte_interval: u64,
    byte_reports: u64,
    block_reports: u32,

    bytes_read: u64,
    blocks_read: u32,
}

impl ProgressReporter {
    pub fn new(total_bytes: u64) -> Self {
        ProgressReporter {
            total_bytes,
            start: Instant::now(),
            byte_interval: (total_bytes / 100).max(1),
            byte_reports: 0,
            block_reports: 0,
            bytes_read: 0,
            blocks_read: 0,
        }
    }

    /// Учесть один прочитанный блок (block_len — с обвязкой записи).
    /// Возвращает строку статуса, если какая-то из частот сработала.
    pub fn record(&mut self, block_len: u32) -> Option<String> {
        self.bytes_read += u64::from(block_len);
        self.blocks_read += 1;

        let mut fire = false;
        if self.bytes_read / self.byte_interval > self.byte_reports {
            self.byte_reports = self.bytes_read / self.byte_interval;
            fire = true;
        }
        if self.blocks_read / BLOCK_REPORT_INTERVAL > self.block_reports {
            self.block_reports = self.blocks_read / BLOCK_REPORT_INTERVAL;
            fire = true;
        }
        fire.then(|| self.status_line())
    }

    fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_read as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }

    /// Человекочитаемая строка статуса. Безопасна при bytes_read == 0.
    pub fn status_line(&self) -> String {
        let fraction = self.fraction();
        let percent = fraction * 100.0;
        let elapsed = self.start.elapsed().as_secs_f64();
        let eta = if fraction > 0.0 {
            format!("{:.0}s", elapsed * (1.0 - fraction) / fraction)
        } else {
            "n/a".to_string()
        };
        format!(
            "read {} blocks, {}/{} bytes ({:.1}%), elapsed {:.0}s, eta {}",
            self.blocks_read, self.bytes_read, self.total_bytes, percent, elapsed, eta
        )
    }
}
