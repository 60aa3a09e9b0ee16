//! 有界定间隔轮询
//!
//! 异步操作（如部署实例启动）通过反复查询状态来等待完成。每次查询的结果是
//! 三选一的 [`Attempt`]：成功则立即结束，`Retry` 消耗一次机会后等待下一次，
//! `Fatal` 立即终止整个轮询。两次查询之间固定休眠 `interval`，最后一次查询
//! 之后不再休眠。

use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// 单次查询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T, E> {
    /// 操作已完成
    Success(T),
    /// 操作尚未完成，可以重试
    Retry,
    /// 不可恢复的错误
    Fatal(E),
}

/// 轮询失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// 某次查询返回了硬错误
    Fatal { attempt: u32, error: E },
    /// 所有机会都已用完
    Exhausted { attempts: u32 },
}

/// 轮询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多查询次数
    pub max_attempts: u32,
    /// 两次查询之间的间隔
    pub interval: Duration,
}

impl RetryPolicy {
    /// 创建轮询策略
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(30, Duration::from_millis(1000))
    }
}

/// 一次轮询过程的临时状态，轮询结束即丢弃
#[derive(Debug)]
pub struct RetrySession {
    attempts_remaining: u32,
    interval: Duration,
    attempts_made: u32,
}

impl RetrySession {
    /// 按策略开启新的轮询
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts_remaining: policy.max_attempts,
            interval: policy.interval,
            attempts_made: 0,
        }
    }

    /// 领取下一次查询机会，返回从1开始的序号
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.attempts_remaining == 0 {
            return None;
        }
        self.attempts_remaining -= 1;
        self.attempts_made += 1;
        Some(self.attempts_made)
    }

    /// 剩余机会
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// 已使用的机会
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// 间隔
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// 按策略执行轮询
///
/// # 参数
/// * `policy` - 轮询策略
/// * `operation` - 每次查询，参数为从1开始的序号
///
/// # 返回
/// * `Ok(T)` - 某次查询成功
/// * `Err(RetryError)` - 硬错误或机会耗尽
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut session = RetrySession::new(policy);

    while let Some(attempt) = session.next_attempt() {
        match operation(attempt).await {
            Attempt::Success(value) => {
                debug!("第 {} 次查询成功", attempt);
                return Ok(value);
            }
            Attempt::Fatal(error) => {
                debug!("第 {} 次查询出现硬错误，终止轮询", attempt);
                return Err(RetryError::Fatal { attempt, error });
            }
            Attempt::Retry => {
                trace!(
                    "第 {} 次查询尚未完成，剩余 {} 次",
                    attempt,
                    session.attempts_remaining()
                );
                if session.attempts_remaining() > 0 {
                    tokio::time::sleep(session.interval()).await;
                }
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: session.attempts_made(),
    })
}
