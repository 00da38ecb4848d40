use alloc::{sync::Arc, vec::Vec};
use core::{
    fmt,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicU64, Ordering},
};

use spin::Mutex;
use tracing::debug;

use crate::{
    config::WriterConfig,
    strategy::{BufferStrategy, DefaultStrategy},
    writer::Writer,
};

/// 默认保留的空闲写入器上限。
pub const DEFAULT_MAX_IDLE: usize = 16;

/// `WriterPool` 基于自由链表复用 [`Writer`] 实例，减少热路径上块列表与 fork 栈的重复分配。
///
/// # 核心机制（How）
/// - 内部维护 `spin::Mutex<Vec<Writer<S>>>` 作为自由链表，`acquire` 优先弹出空闲实例；
/// - [`PooledWriter`] 在 `Drop` 阶段执行 `reset_all` 后归还，链表已满时直接丢弃；
/// - `PoolMetrics` 以原子计数记录新建、复用、丢弃次数，`statistics` 返回快照。
///
/// # 契约说明（What）
/// - **线程安全**：句柄可克隆并跨线程共享，单个 [`PooledWriter`] 仍归一个线程独占；
/// - **后置条件**：`acquire` 返回的写入器深度为 0 且当前作用域为空，配置与池一致；
/// - 活动缓冲在归还时即被释放，池只保留各级 `Vec` 的容量。
///
/// # 设计权衡（Trade-offs）
/// - 使用自旋锁而非阻塞互斥量，临界区只有一次 `push`/`pop`；
/// - `shrink_to_fit` 采取清空自由链表的简单策略，便于在峰值过后归还内存。
pub struct WriterPool<S: BufferStrategy = DefaultStrategy> {
    inner: Arc<PoolInner<S>>,
}

impl<S: BufferStrategy> Clone for WriterPool<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: BufferStrategy> Default for WriterPool<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: BufferStrategy> WriterPool<S> {
    /// 以默认写入器配置与默认空闲上限创建池。
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default(), DEFAULT_MAX_IDLE)
    }

    /// 以给定写入器配置与空闲上限创建池；`max_idle` 为 0 时每次归还都会丢弃。
    pub fn with_config(config: WriterConfig, max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                free_list: Mutex::new(Vec::new()),
                config,
                max_idle,
                metrics: PoolMetrics::default(),
            }),
        }
    }

    /// 租借一个空写入器。
    pub fn acquire(&self) -> PooledWriter<S> {
        let reused = self.inner.free_list.lock().pop();
        let writer = match reused {
            Some(writer) => {
                self.inner.metrics.reused.fetch_add(1, Ordering::Relaxed);
                writer
            }
            None => {
                self.inner.metrics.created.fetch_add(1, Ordering::Relaxed);
                Writer::with_config(self.inner.config)
            }
        };
        PooledWriter {
            writer: Some(writer),
            pool: Arc::clone(&self.inner),
        }
    }

    /// 清空自由链表，返回释放的写入器数量。
    pub fn shrink_to_fit(&self) -> usize {
        let mut list = self.inner.free_list.lock();
        let released = list.len();
        list.clear();
        drop(list);
        if released > 0 {
            debug!(strategy = S::NAME, released, "writer pool shrunk");
        }
        released
    }

    /// 读取统计快照。
    pub fn statistics(&self) -> PoolStats {
        let idle = self.inner.free_list.lock().len();
        let metrics = &self.inner.metrics;
        PoolStats {
            created: metrics.created.load(Ordering::Relaxed),
            reused: metrics.reused.load(Ordering::Relaxed),
            discarded: metrics.discarded.load(Ordering::Relaxed),
            idle,
        }
    }
}

impl<S: BufferStrategy> fmt::Debug for WriterPool<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterPool")
            .field("strategy", &S::NAME)
            .field("max_idle", &self.inner.max_idle)
            .field("stats", &self.statistics())
            .finish()
    }
}

/// 池统计快照。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// 因自由链表为空而新建的写入器数。
    pub created: u64,
    /// 从自由链表复用的次数。
    pub reused: u64,
    /// 归还时因链表已满而丢弃的写入器数。
    pub discarded: u64,
    /// 当前空闲写入器数。
    pub idle: usize,
}

struct PoolInner<S: BufferStrategy> {
    free_list: Mutex<Vec<Writer<S>>>,
    config: WriterConfig,
    max_idle: usize,
    metrics: PoolMetrics,
}

impl<S: BufferStrategy> PoolInner<S> {
    fn reclaim(&self, mut writer: Writer<S>) {
        writer.reset_all();
        let mut list = self.free_list.lock();
        if list.len() < self.max_idle {
            list.push(writer);
            return;
        }
        drop(list);
        let discarded = self.metrics.discarded.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            strategy = S::NAME,
            max_idle = self.max_idle,
            discarded,
            "writer pool full, dropping returned writer"
        );
    }
}

#[derive(Default)]
struct PoolMetrics {
    created: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

/// 从 [`WriterPool`] 租借的写入器，解引用为 [`Writer`]，离开作用域时自动归还。
pub struct PooledWriter<S: BufferStrategy = DefaultStrategy> {
    writer: Option<Writer<S>>,
    pool: Arc<PoolInner<S>>,
}

impl<S: BufferStrategy> PooledWriter<S> {
    /// 脱离池，取走内部写入器；之后不再归还。
    pub fn detach(mut self) -> Writer<S> {
        self.writer.take().unwrap_or_default()
    }
}

impl<S: BufferStrategy> Deref for PooledWriter<S> {
    type Target = Writer<S>;

    fn deref(&self) -> &Writer<S> {
        // `writer` 只在 `detach` 与 `Drop` 中取走，两者都消费了句柄。
        match self.writer.as_ref() {
            Some(writer) => writer,
            None => unreachable!("pooled writer already released"),
        }
    }
}

impl<S: BufferStrategy> DerefMut for PooledWriter<S> {
    fn deref_mut(&mut self) -> &mut Writer<S> {
        match self.writer.as_mut() {
            Some(writer) => writer,
            None => unreachable!("pooled writer already released"),
        }
    }
}

impl<S: BufferStrategy> Drop for PooledWriter<S> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            self.pool.reclaim(writer);
        }
    }
}

impl<S: BufferStrategy> fmt::Debug for PooledWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledWriter").field(&self.writer).finish()
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::strategy::ArrayBuffer;

    #[test]
    fn returned_writer_is_reused_empty() {
        let pool: WriterPool<ArrayBuffer> = WriterPool::new();
        {
            let mut writer = pool.acquire();
            writer.uint32(7).fork().uint32(8);
        }
        let stats = pool.statistics();
        assert_eq!((stats.created, stats.reused, stats.idle), (1, 0, 1));

        let mut writer = pool.acquire();
        assert_eq!(writer.depth(), 0);
        assert!(writer.is_empty());
        writer.uint32(1);
        assert_eq!(&writer.finish()[..], &[1]);
        assert_eq!(pool.statistics().reused, 1);
    }

    #[test]
    fn detached_writer_is_not_returned() {
        let pool: WriterPool<ArrayBuffer> = WriterPool::new();
        let writer = pool.acquire().detach();
        drop(writer);
        assert_eq!(pool.statistics().idle, 0);
    }

    #[test]
    #[traced_test]
    fn full_free_list_discards_returns() {
        let pool: WriterPool<ArrayBuffer> = WriterPool::with_config(WriterConfig::default(), 1);
        let first = pool.acquire();
        let second = pool.acquire();
        drop(first);
        drop(second);
        let stats = pool.statistics();
        assert_eq!((stats.created, stats.discarded, stats.idle), (2, 1, 1));
        assert!(logs_contain("writer pool full"));
        assert_eq!(pool.shrink_to_fit(), 1);
        assert_eq!(pool.statistics().idle, 0);
    }
}
