/// 任务状态 - 空闲或等待到期
#[derive(Debug, Clone, Copy, PartialEq)]
enum TaskState {
    Idle,
    Pending { deadline: f64 },
}

/// 模拟提交任务 - 表单订阅、加载更多等"假异步"动作的状态机
///
/// 用固定延迟模拟网络耗时。同一触发源同时只允许一个未完成任务：
/// start在任务未完成时拒绝启动，页面脚本据此在任务期间禁用按钮。
/// 任务一旦启动不可取消，到期后poll恰好报告一次完成。
pub struct SubmitTask {
    delay_ms: f64,
    state: TaskState,
}

impl SubmitTask {
    pub fn new(delay_ms: f64) -> Self {
        SubmitTask {
            delay_ms,
            state: TaskState::Idle,
        }
    }

    /// 启动一次模拟提交；已有未完成任务时拒绝并返回false
    pub fn start(&mut self, now_ms: f64) -> bool {
        match self.state {
            TaskState::Pending { .. } => false,
            TaskState::Idle => {
                self.state = TaskState::Pending {
                    deadline: now_ms + self.delay_ms,
                };
                true
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TaskState::Pending { .. })
    }

    /// 到期时完成任务并返回true，恰好返回一次
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.state {
            TaskState::Pending { deadline } if now_ms >= deadline => {
                self.state = TaskState::Idle;
                true
            }
            _ => false,
        }
    }
}
