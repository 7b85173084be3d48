use std::fmt;

/// 单个 worker 的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 会话正常结束
    Completed,
    /// 等待解锁期间收到停止信号，应用从未启动
    CancelledBeforeStart,
    /// 会话运行期间收到停止信号
    CancelledDuringRun,
    /// 会话出错
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::CancelledBeforeStart => "cancelled-before-start",
            RunOutcome::CancelledDuringRun => "cancelled-during-run",
            RunOutcome::Failed => "failed",
        };
        f.write_str(label)
    }
}
