//! 密钥生成服务
//!
//! 在后台线程中逐位生成数字密钥，通过停止标志中断，
//! 生成进度以事件的形式发送给 UI 线程

use crate::models::{GenerationProgress, GenerationState, KEY_ALPHABET, MAX_KEY_LENGTH};
use crate::utils::{KeyGenError, KeyGenResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 停止标志的轮询粒度
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 密钥生成事件
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// 开始生成
    Started { session: Uuid, total: usize },
    /// 新增一位
    Progress {
        session: Uuid,
        key: String,
        progress: GenerationProgress,
    },
    /// 生成结束（完成或被停止）
    Finished {
        session: Uuid,
        state: GenerationState,
        key: String,
    },
}

impl GenerationEvent {
    /// 事件所属的生成会话
    pub fn session(&self) -> Uuid {
        match self {
            GenerationEvent::Started { session, .. }
            | GenerationEvent::Progress { session, .. }
            | GenerationEvent::Finished { session, .. } => *session,
        }
    }
}

/// 生成器共享状态
#[derive(Debug, Default)]
struct GeneratorShared {
    session: Option<Uuid>,
    key: String,
    state: GenerationState,
    progress: GenerationProgress,
}

/// 密钥生成器
pub struct KeyGenerator {
    shared: Arc<Mutex<GeneratorShared>>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    event_sender: Sender<GenerationEvent>,
    event_receiver: Receiver<GenerationEvent>,
    rng_seed: Option<u64>,
}

impl KeyGenerator {
    /// 创建新的密钥生成器
    pub fn new() -> Self {
        let (event_sender, event_receiver) = unbounded();

        Self {
            shared: Arc::new(Mutex::new(GeneratorShared::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            event_sender,
            event_receiver,
            rng_seed: None,
        }
    }

    /// 使用固定随机种子，生成结果可复现
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// 开始生成指定长度的密钥，总耗时约为 `total_time`
    pub fn start(&mut self, length: usize, total_time: Duration) -> KeyGenResult<Uuid> {
        if length == 0 || length > MAX_KEY_LENGTH {
            return Err(KeyGenError::InvalidLength { max: MAX_KEY_LENGTH });
        }
        if total_time.is_zero() {
            return Err(KeyGenError::InvalidDuration);
        }
        if !self.lock_shared().state.can_start() {
            return Err(KeyGenError::AlreadyRunning);
        }

        // 回收已结束的旧线程
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("上一个生成线程异常退出");
            }
        }

        let session = Uuid::new_v4();
        // 每个会话使用独立的停止标志，旧线程不会被新会话复活
        self.stop_flag = Arc::new(AtomicBool::new(false));

        {
            let mut shared = self.lock_shared();
            shared.session = Some(session);
            shared.key.clear();
            shared.state = GenerationState::Generating;
            shared.progress = GenerationProgress::new(length);
        }

        let interval = total_time / length as u32;
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let worker = GenerationWorker {
            session,
            length,
            interval,
            rng,
            shared: Arc::clone(&self.shared),
            stop_flag: Arc::clone(&self.stop_flag),
            events: self.event_sender.clone(),
        };

        info!("开始生成密钥: 长度 {}，每位间隔 {:?}，会话 {}", length, interval, session);
        let _ = self.event_sender.send(GenerationEvent::Started { session, total: length });

        let handle = std::thread::Builder::new()
            .name("key-generator".to_string())
            .spawn(move || worker.run())
            .map_err(|e| KeyGenError::worker_failed(&e.to_string()))?;
        self.worker = Some(handle);

        Ok(session)
    }

    /// 请求停止当前生成
    pub fn stop(&self) {
        if !self.stop_flag.swap(true, Ordering::SeqCst) {
            info!("请求停止密钥生成");
        }
    }

    /// 停止生成并清空密钥与进度
    pub fn reset(&mut self) {
        self.stop();
        // 线程退出后会发现会话已失效，不会再写入共享状态
        self.worker = None;

        let mut shared = self.lock_shared();
        *shared = GeneratorShared::default();
        info!("密钥生成器已初始化");
    }

    /// 等待当前生成线程结束并返回最终状态
    pub fn wait(&mut self) -> KeyGenResult<GenerationState> {
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| KeyGenError::worker_failed("生成线程异常退出"))?;
        }
        Ok(self.state())
    }

    /// 订阅生成事件
    ///
    /// crossbeam 通道为多消费者竞争模式，每个事件只会被一个接收者取走。
    pub fn subscribe(&self) -> Receiver<GenerationEvent> {
        self.event_receiver.clone()
    }

    /// 当前已生成的密钥（未分组）
    pub fn current_key(&self) -> String {
        self.lock_shared().key.clone()
    }

    pub fn state(&self) -> GenerationState {
        self.lock_shared().state
    }

    pub fn progress(&self) -> GenerationProgress {
        self.lock_shared().progress
    }

    /// 当前会话ID
    pub fn session(&self) -> Option<Uuid> {
        self.lock_shared().session
    }

    fn lock_shared(&self) -> MutexGuard<'_, GeneratorShared> {
        // 线程 panic 不影响字符串等简单状态的一致性
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for KeyGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 后台生成线程
struct GenerationWorker {
    session: Uuid,
    length: usize,
    interval: Duration,
    rng: StdRng,
    shared: Arc<Mutex<GeneratorShared>>,
    stop_flag: Arc<AtomicBool>,
    events: Sender<GenerationEvent>,
}

impl GenerationWorker {
    fn run(mut self) {
        for index in 0..self.length {
            if self.stop_flag.load(Ordering::SeqCst) {
                break;
            }

            let digit = KEY_ALPHABET[self.rng.gen_range(0..KEY_ALPHABET.len())] as char;

            let (key, progress) = {
                let mut shared = self.lock_shared();
                if shared.session != Some(self.session) {
                    debug!("会话 {} 已失效，生成线程退出", self.session);
                    return;
                }
                shared.key.push(digit);
                shared.progress.generated = index + 1;
                (shared.key.clone(), shared.progress)
            };

            let _ = self.events.send(GenerationEvent::Progress {
                session: self.session,
                key,
                progress,
            });

            self.sleep_interruptible();
        }

        let (state, key) = {
            let mut shared = self.lock_shared();
            if shared.session != Some(self.session) {
                return;
            }
            shared.state = if shared.progress.is_complete() {
                GenerationState::Completed
            } else {
                GenerationState::Stopped
            };
            (shared.state, shared.key.clone())
        };

        info!("密钥生成结束: {}，共 {} 位", state, key.len());
        let _ = self.events.send(GenerationEvent::Finished {
            session: self.session,
            state,
            key,
        });
    }

    /// 睡眠一个间隔，期间收到停止请求则提前返回
    ///
    /// 间隔超出 `Instant` 的表示范围时一直等待到停止
    fn sleep_interruptible(&self) {
        let deadline = Instant::now().checked_add(self.interval);
        loop {
            if self.stop_flag.load(Ordering::SeqCst) {
                return;
            }
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    deadline - now
                }
                None => STOP_POLL_INTERVAL,
            };
            std::thread::sleep(remaining.min(STOP_POLL_INTERVAL));
        }
    }

    fn lock_shared(&self) -> MutexGuard<'_, GeneratorShared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
