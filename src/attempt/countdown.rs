use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 剩余时间的紧迫程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    /// 少于 5 分钟
    Warning,
    /// 少于 1 分钟
    Critical,
}

/// 秒级倒计时，到期只触发一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    expired: bool,
}

impl Countdown {
    pub fn new(seconds: u64) -> Self {
        Self {
            remaining: seconds,
            expired: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// 走一秒；恰好在到期的那一次返回 `true`
    pub fn tick(&mut self) -> bool {
        if self.expired {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            return true;
        }
        false
    }

    pub fn urgency(&self) -> Urgency {
        match self.remaining {
            r if r < 60 => Urgency::Critical,
            r if r < 300 => Urgency::Warning,
            _ => Urgency::Normal,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_clock(self.remaining))
    }
}

/// `h:mm:ss`（一小时及以上）或 `m:ss`
pub fn format_clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// 倒计时事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Remaining(u64),
    Expired,
}

/// 后台驱动的倒计时，丢弃即停止
pub struct CountdownTask {
    handle: JoinHandle<()>,
}

impl CountdownTask {
    /// 每个 `period` 走一秒，事件发送到返回的接收端
    pub fn spawn(seconds: u64, period: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            let mut countdown = Countdown::new(seconds);
            if seconds == 0 {
                let _ = tx.send(Tick::Expired).await;
                return;
            }
            let mut interval = tokio::time::interval(period);
            // 第一次 tick 立即完成
            interval.tick().await;
            loop {
                interval.tick().await;
                let expired = countdown.tick();
                let event = if expired {
                    Tick::Expired
                } else {
                    Tick::Remaining(countdown.remaining())
                };
                if tx.send(event).await.is_err() || expired {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    /// 停止计时，接收端随后收到 `None`
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
