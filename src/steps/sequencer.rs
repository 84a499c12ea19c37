//! Forward/backward state machine over an ordered task list.

use tokio::sync::watch;

use super::task::{StepStatus, StepTask};

/// Steps through a workflow one task at a time.
///
/// The task marked `inprogress` is the current one. Moving forward
/// completes it and starts the task whose index is one higher; moving
/// backward resets it to incomplete and restarts the task one lower.
/// Transitions that cannot happen (no current task, first or last task,
/// missing neighbour) do nothing.
///
/// Every change is pushed to a single-slot feed; readers only ever see
/// the latest task list.
pub struct StepSequencer {
    steps: Vec<StepTask>,
    feed: watch::Sender<Vec<StepTask>>,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        let (feed, _) = watch::channel(Vec::new());
        Self {
            steps: Vec::new(),
            feed,
        }
    }

    pub fn with_steps(steps: Vec<StepTask>) -> Self {
        let mut sequencer = Self::new();
        sequencer.set_steps(steps);
        sequencer
    }

    /// Replace the whole sequence. No task is selected automatically.
    ///
    /// At most one task should be `inprogress`; keeping it that way is up
    /// to the caller. With several, stepping acts on the lowest-indexed one
    /// and leaves the others marked in progress.
    pub fn set_steps(&mut self, mut steps: Vec<StepTask>) {
        steps.sort_by_key(|s| s.index);
        let in_progress = steps.iter().filter(|s| s.is_in_progress()).count();
        if in_progress > 1 {
            tracing::warn!(
                count = in_progress,
                "Sequence has more than one task in progress, stepping uses the lowest index"
            );
        }
        self.steps = steps;
        self.push();
    }

    /// Subscribe to the task list feed
    pub fn subscribe(&self) -> watch::Receiver<Vec<StepTask>> {
        self.feed.subscribe()
    }

    pub fn steps(&self) -> &[StepTask] {
        &self.steps
    }

    /// The task currently in progress
    pub fn current(&self) -> Option<&StepTask> {
        self.steps.iter().find(|s| s.is_in_progress())
    }

    pub fn step_forward(&mut self) {
        let Some(current) = self.current().map(|s| s.index) else {
            tracing::debug!("step_forward: no task in progress");
            return;
        };
        if Some(current) == self.last_index() {
            tracing::debug!(index = current, "step_forward: already at last task");
            return;
        }
        let Some(next) = current.checked_add(1) else {
            return;
        };
        if !self.transition(current, next, StepStatus::Complete) {
            tracing::debug!(index = current, "step_forward: no task at next index");
        }
    }

    pub fn step_backward(&mut self) {
        let Some(current) = self.current().map(|s| s.index) else {
            tracing::debug!("step_backward: no task in progress");
            return;
        };
        // Index 0 is the first task
        let Some(previous) = current.checked_sub(1) else {
            tracing::debug!("step_backward: already at first task");
            return;
        };
        if !self.transition(current, previous, StepStatus::Incomplete) {
            tracing::debug!(index = current, "step_backward: no task at previous index");
        }
    }

    /// `step_forward` followed by `step_backward`.
    ///
    /// Leaves the pointer where it was, except on the last task: the
    /// forward step does nothing there, so the backward step moves the
    /// pointer one task back.
    pub fn flush(&mut self) {
        self.step_forward();
        self.step_backward();
    }

    /// (position of the current task, total tasks); position is 0 when
    /// nothing is in progress
    pub fn progress(&self) -> (usize, usize) {
        let position = self
            .steps
            .iter()
            .position(StepTask::is_in_progress)
            .unwrap_or(0);
        (position, self.steps.len())
    }

    /// Render the sequence like `plan > [build] > test`
    pub fn format_progress(&self) -> String {
        self.steps
            .iter()
            .map(|s| {
                if s.is_in_progress() {
                    format!("[{}]", s.name)
                } else {
                    s.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn last_index(&self) -> Option<u32> {
        self.steps.iter().map(|s| s.index).max()
    }

    fn position_of(&self, index: u32) -> Option<usize> {
        self.steps.iter().position(|s| s.index == index)
    }

    /// Move the in-progress marker from `from` to `to`, leaving `from`
    /// with `left_as`. Returns false without touching anything when either
    /// index is missing.
    fn transition(&mut self, from: u32, to: u32, left_as: StepStatus) -> bool {
        let (Some(from_pos), Some(to_pos)) = (self.position_of(from), self.position_of(to)) else {
            return false;
        };
        self.steps[from_pos].status = left_as;
        self.steps[to_pos].status = StepStatus::InProgress;
        tracing::debug!(from, to, step = %self.steps[to_pos].name, "Step changed");
        self.push();
        true
    }

    fn push(&self) {
        self.feed.send_replace(self.steps.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::task::sequence_from_names;

    fn statuses(sequencer: &StepSequencer) -> Vec<StepStatus> {
        sequencer.steps().iter().map(|s| s.status).collect()
    }

    fn two_steps() -> StepSequencer {
        StepSequencer::with_steps(vec![
            StepTask::new("plan", 0).with_status(StepStatus::InProgress),
            StepTask::new("build", 1),
        ])
    }

    #[test]
    fn test_step_forward_moves_marker() {
        let mut sequencer = two_steps();
        sequencer.step_forward();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::Complete, StepStatus::InProgress]
        );
    }

    #[test]
    fn test_step_forward_saturates_at_last() {
        let mut sequencer = two_steps();
        sequencer.step_forward();
        sequencer.step_forward();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::Complete, StepStatus::InProgress]
        );
    }

    #[test]
    fn test_step_backward_at_first_is_noop() {
        let mut sequencer = two_steps();
        sequencer.step_backward();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::InProgress, StepStatus::Incomplete]
        );
    }

    #[test]
    fn test_step_backward_moves_marker() {
        let mut sequencer = two_steps();
        sequencer.step_forward();
        sequencer.step_backward();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::InProgress, StepStatus::Incomplete]
        );
    }

    #[test]
    fn test_no_task_in_progress_is_noop() {
        let mut sequencer = StepSequencer::with_steps(sequence_from_names(&["a", "b"], false));
        sequencer.step_forward();
        sequencer.step_backward();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::Incomplete, StepStatus::Incomplete]
        );
        assert!(sequencer.current().is_none());
    }

    #[test]
    fn test_set_steps_does_not_select_task() {
        let mut sequencer = StepSequencer::new();
        sequencer.set_steps(sequence_from_names(&["a", "b", "c"], false));
        assert!(sequencer.current().is_none());
    }

    #[test]
    fn test_extra_in_progress_tasks_are_left_alone() {
        let mut sequencer = StepSequencer::with_steps(vec![
            StepTask::new("a", 0).with_status(StepStatus::InProgress),
            StepTask::new("b", 1),
            StepTask::new("c", 2).with_status(StepStatus::InProgress),
        ]);
        assert_eq!(sequencer.current().unwrap().name, "a");

        sequencer.step_forward();
        assert_eq!(
            statuses(&sequencer),
            vec![
                StepStatus::Complete,
                StepStatus::InProgress,
                StepStatus::InProgress,
            ]
        );
        assert_eq!(sequencer.current().unwrap().name, "b");
    }

    #[test]
    fn test_lookup_is_by_index_not_position() {
        // Given out of order; stepping still follows index order
        let mut sequencer = StepSequencer::with_steps(vec![
            StepTask::new("third", 2),
            StepTask::new("first", 0).with_status(StepStatus::InProgress),
            StepTask::new("second", 1),
        ]);
        sequencer.step_forward();
        assert_eq!(sequencer.current().unwrap().name, "second");
        sequencer.step_forward();
        assert_eq!(sequencer.current().unwrap().name, "third");
    }

    #[test]
    fn test_gap_in_indices_is_noop() {
        let mut sequencer = StepSequencer::with_steps(vec![
            StepTask::new("a", 0).with_status(StepStatus::InProgress),
            StepTask::new("c", 2),
        ]);
        sequencer.step_forward();
        assert_eq!(sequencer.current().unwrap().name, "a");
    }

    #[test]
    fn test_flush_in_middle_keeps_pointer() {
        let mut sequencer = StepSequencer::with_steps(vec![
            StepTask::new("a", 0).with_status(StepStatus::Complete),
            StepTask::new("b", 1).with_status(StepStatus::InProgress),
            StepTask::new("c", 2),
        ]);
        sequencer.flush();
        assert_eq!(
            statuses(&sequencer),
            vec![
                StepStatus::Complete,
                StepStatus::InProgress,
                StepStatus::Incomplete
            ]
        );
    }

    #[test]
    fn test_flush_at_last_moves_back() {
        let mut sequencer = two_steps();
        sequencer.step_forward();
        sequencer.flush();
        assert_eq!(
            statuses(&sequencer),
            vec![StepStatus::InProgress, StepStatus::Incomplete]
        );
    }

    #[test]
    fn test_feed_holds_latest_list() {
        let mut sequencer = two_steps();
        let mut feed = sequencer.subscribe();
        assert!(!feed.has_changed().unwrap());

        sequencer.step_forward();
        sequencer.step_backward();
        sequencer.step_forward();

        assert!(feed.has_changed().unwrap());
        let latest = feed.borrow_and_update().clone();
        assert_eq!(latest, sequencer.steps().to_vec());
        assert!(!feed.has_changed().unwrap());
    }

    #[test]
    fn test_noop_does_not_push() {
        let mut sequencer = two_steps();
        let feed = sequencer.subscribe();
        sequencer.step_backward();
        assert!(!feed.has_changed().unwrap());
    }

    #[test]
    fn test_format_progress() {
        let mut sequencer = StepSequencer::with_steps(sequence_from_names(
            &["plan", "build", "test"],
            true,
        ));
        sequencer.step_forward();
        assert_eq!(sequencer.format_progress(), "plan > [build] > test");
        assert_eq!(sequencer.progress(), (1, 3));
    }
}
