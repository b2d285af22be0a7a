//! Task and Queue Lifecycle Tests
//!
//! Covers holder/waiter transitions that are not plain hand-offs, task exit
//! and queue destruction.

#[cfg(test)]
mod tests {
    use crate::isolation::{atomic_scheduler, spawn, task};
    use nexa_pdsched::SchedError;

    // =========================================================================
    // Holder transitions
    // =========================================================================

    #[test]
    fn test_acquire_replaces_holder_and_moves_donation() {
        let mut sched = atomic_scheduler();
        let a = task(1);
        let b = task(2);
        let w = spawn(&mut sched, 3, 6);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, a).unwrap();
        sched.wait_for_access(q, w).unwrap();
        assert_eq!(sched.effective_priority(a), Ok(6));

        sched.acquire(q, b).unwrap();
        assert_eq!(sched.holder(q), Ok(Some(b)));
        assert_eq!(sched.effective_priority(a), Ok(1));
        assert_eq!(sched.effective_priority(b), Ok(6));
    }

    #[test]
    fn test_reacquire_by_holder_is_harmless() {
        let mut sched = atomic_scheduler();
        let h = task(1);
        let w = spawn(&mut sched, 2, 4);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, h).unwrap();
        sched.wait_for_access(q, w).unwrap();
        sched.acquire(q, h).unwrap();

        assert_eq!(sched.holder(q), Ok(Some(h)));
        assert_eq!(sched.waiters(q), Ok(vec![w]));
        assert_eq!(sched.effective_priority(h), Ok(4));
    }

    #[test]
    fn test_direct_acquire_while_waiting_leaves_waiter_list() {
        let mut sched = atomic_scheduler();
        let h = task(1);
        let w = spawn(&mut sched, 2, 5);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, h).unwrap();
        sched.wait_for_access(q, w).unwrap();
        sched.acquire(q, w).unwrap();

        assert_eq!(sched.holder(q), Ok(Some(w)));
        assert_eq!(sched.waiters(q), Ok(vec![]));
        assert_eq!(sched.effective_priority(h), Ok(1));
        // w no longer donates to itself through q
        assert_eq!(sched.queue_priority(q), Ok(0));
    }

    #[test]
    fn test_wait_on_held_queue_gives_it_up() {
        let mut sched = atomic_scheduler();
        let t = spawn(&mut sched, 1, 3);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, t).unwrap();
        sched.wait_for_access(q, t).unwrap();

        assert_eq!(sched.holder(q), Ok(None));
        assert_eq!(sched.waiters(q), Ok(vec![t]));
        assert_eq!(sched.next_thread(q), Ok(Some(t)));
        assert_eq!(sched.holder(q), Ok(Some(t)));
    }

    #[test]
    fn test_duplicate_wait_rejected() {
        let mut sched = atomic_scheduler();
        let t = task(1);
        let q = sched.new_wait_queue(true);

        sched.wait_for_access(q, t).unwrap();
        assert_eq!(
            sched.wait_for_access(q, t),
            Err(SchedError::AlreadyWaiting { task: t, queue: q })
        );
        assert_eq!(sched.waiters(q), Ok(vec![t]), "listed only once");
    }

    #[test]
    fn test_task_may_wait_on_several_queues() {
        let mut sched = atomic_scheduler();
        let h1 = task(1);
        let h2 = task(2);
        let w = spawn(&mut sched, 3, 5);
        let q1 = sched.new_wait_queue(true);
        let q2 = sched.new_wait_queue(true);

        sched.acquire(q1, h1).unwrap();
        sched.acquire(q2, h2).unwrap();
        sched.wait_for_access(q1, w).unwrap();
        sched.wait_for_access(q2, w).unwrap();

        assert_eq!(sched.effective_priority(h1), Ok(5));
        assert_eq!(sched.effective_priority(h2), Ok(5));

        sched.set_priority(w, 7).unwrap();
        assert_eq!(sched.effective_priority(h1), Ok(7));
        assert_eq!(sched.effective_priority(h2), Ok(7));
    }

    // =========================================================================
    // Task exit
    // =========================================================================

    #[test]
    fn test_exit_of_holder_keeps_waiters() {
        let mut sched = atomic_scheduler();
        let h = task(1);
        let w1 = spawn(&mut sched, 2, 2);
        let w2 = spawn(&mut sched, 3, 4);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, h).unwrap();
        sched.wait_for_access(q, w1).unwrap();
        sched.wait_for_access(q, w2).unwrap();

        assert_eq!(sched.exit_task(h), Ok(true));
        assert!(!sched.is_tracked(h));
        assert_eq!(sched.holder(q), Ok(None));
        assert_eq!(sched.waiters(q), Ok(vec![w1, w2]));

        assert_eq!(sched.next_thread(q), Ok(Some(w2)));
        assert_eq!(sched.effective_priority(w2), Ok(4));
    }

    #[test]
    fn test_exit_of_waiter_withdraws_donation() {
        let mut sched = atomic_scheduler();
        let h = task(1);
        let w = spawn(&mut sched, 2, 6);
        let q = sched.new_wait_queue(true);

        sched.acquire(q, h).unwrap();
        sched.wait_for_access(q, w).unwrap();
        assert_eq!(sched.effective_priority(h), Ok(6));

        assert_eq!(sched.exit_task(w), Ok(true));
        assert_eq!(sched.waiters(q), Ok(vec![]));
        assert_eq!(sched.effective_priority(h), Ok(1));
    }

    #[test]
    fn test_exit_in_middle_of_chain() {
        let mut sched = atomic_scheduler();
        let a = task(1);
        let b = task(2);
        let c = spawn(&mut sched, 3, 7);
        let q1 = sched.new_wait_queue(true);
        let q2 = sched.new_wait_queue(true);

        sched.acquire(q1, a).unwrap();
        sched.acquire(q2, b).unwrap();
        sched.wait_for_access(q1, b).unwrap();
        sched.wait_for_access(q2, c).unwrap();
        assert_eq!(sched.effective_priority(a), Ok(7));

        sched.exit_task(b).unwrap();
        assert_eq!(sched.effective_priority(a), Ok(1));
        assert_eq!(sched.holder(q2), Ok(None));
        assert_eq!(sched.next_thread(q2), Ok(Some(c)));
    }

    #[test]
    fn test_exit_of_unknown_task() {
        let mut sched = atomic_scheduler();
        assert_eq!(sched.exit_task(task(42)), Ok(false));
        assert_eq!(sched.task_count(), 0);
    }

    #[test]
    fn test_reattach_after_exit_starts_fresh() {
        let mut sched = atomic_scheduler();
        let t = spawn(&mut sched, 1, 5);
        let q = sched.new_wait_queue(true);
        sched.acquire(q, t).unwrap();

        sched.exit_task(t).unwrap();
        assert_eq!(sched.task_count(), 0);

        assert_eq!(sched.priority(t), Ok(1));
        assert_eq!(sched.effective_priority(t), Ok(1));
        assert_eq!(sched.holder(q), Ok(None));
    }

    #[test]
    fn test_tracked_priority_does_not_attach() {
        let mut sched = atomic_scheduler();
        let t = task(8);

        assert_eq!(sched.tracked_priority(t), Err(SchedError::UnknownTask(t)));
        assert!(!sched.is_tracked(t));

        spawn(&mut sched, 8, 3);
        assert_eq!(sched.tracked_priority(t), Ok(3));
    }

    // =========================================================================
    // Queue destruction
    // =========================================================================

    #[test]
    fn test_destroy_busy_queue_fails() {
        let mut sched = atomic_scheduler();
        let q = sched.new_wait_queue(true);
        sched.wait_for_access(q, task(1)).unwrap();

        assert_eq!(sched.destroy_wait_queue(q), Err(SchedError::QueueBusy(q)));
        assert_eq!(sched.waiters(q), Ok(vec![task(1)]));
    }

    #[test]
    fn test_destroy_releases_holder() {
        let mut sched = atomic_scheduler();
        let h = spawn(&mut sched, 1, 2);
        let q = sched.new_wait_queue(true);
        sched.acquire(q, h).unwrap();

        assert_eq!(sched.destroy_wait_queue(q), Ok(()));
        assert_eq!(sched.queue_count(), 0);
        assert_eq!(sched.effective_priority(h), Ok(2));
    }

    #[test]
    fn test_stale_handle_after_destroy() {
        let mut sched = atomic_scheduler();
        let old = sched.new_wait_queue(true);
        sched.destroy_wait_queue(old).unwrap();

        let new = sched.new_wait_queue(false);
        assert_ne!(old, new, "slot reuse must not revive the old handle");

        assert_eq!(sched.holder(old), Err(SchedError::UnknownQueue(old)));
        assert_eq!(sched.next_thread(old), Err(SchedError::UnknownQueue(old)));
        assert_eq!(
            sched.wait_for_access(old, task(1)),
            Err(SchedError::UnknownQueue(old))
        );
        assert_eq!(sched.destroy_wait_queue(old), Err(SchedError::UnknownQueue(old)));
        assert_eq!(sched.holder(new), Ok(None));
    }

    #[test]
    fn test_queue_count_tracks_create_and_destroy() {
        let mut sched = atomic_scheduler();
        let queues: Vec<_> = (0..4).map(|_| sched.new_wait_queue(true)).collect();
        assert_eq!(sched.queue_count(), 4);

        sched.destroy_wait_queue(queues[1]).unwrap();
        sched.destroy_wait_queue(queues[3]).unwrap();
        assert_eq!(sched.queue_count(), 2);

        sched.new_wait_queue(true);
        assert_eq!(sched.queue_count(), 3);
    }

    #[test]
    fn test_handles_distinct_across_many_slots() {
        let mut sched = atomic_scheduler();
        let mut handles: Vec<_> = (0..2048).map(|_| sched.new_wait_queue(true)).collect();

        // Recycle every other slot; the fresh handles must not alias old ones
        for q in handles.iter().step_by(2) {
            sched.destroy_wait_queue(*q).unwrap();
        }
        for _ in 0..1024 {
            handles.push(sched.new_wait_queue(true));
        }

        let mut sorted: Vec<String> = handles.iter().map(|q| q.to_string()).collect();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), handles.len());

        // Each live handle names its own queue
        for (i, q) in handles.iter().enumerate().skip(2048) {
            sched.acquire(*q, task(i as u64)).unwrap();
        }
        for (i, q) in handles.iter().enumerate().skip(2048) {
            assert_eq!(sched.holder(*q), Ok(Some(task(i as u64))));
        }
        for q in handles.iter().take(2048).step_by(2) {
            assert_eq!(sched.holder(*q), Err(SchedError::UnknownQueue(*q)));
        }
    }
}
