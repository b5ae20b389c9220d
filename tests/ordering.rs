use taskboard::board::{NewTask, TaskBoard};
use taskboard::bulk::{BulkResultKind, BulkUpdate};
use taskboard::config::OrderingConfig;
use taskboard::model::{MilestoneId, Priority, Scope, ScopeMode, TaskId, TaskStatus};
use taskboard::reorder::MoveRequest;
use taskboard::storage::MemoryStore;

fn board(mode: ScopeMode) -> TaskBoard<MemoryStore> {
    let ordering = OrderingConfig {
        scope: mode,
        ..OrderingConfig::default()
    };
    TaskBoard::new(MemoryStore::new(), ordering)
}

fn seeded(mode: ScopeMode, titles: &[&str]) -> (TaskBoard<MemoryStore>, MilestoneId, Vec<TaskId>) {
    let board = board(mode);
    let milestone = board.add_milestone("p1", "Sprint 1").unwrap().id;
    let ids = titles
        .iter()
        .map(|title| {
            board
                .create_task(NewTask::new(*title, milestone.clone()))
                .unwrap()
                .id
        })
        .collect();
    (board, milestone, ids)
}

fn titles(board: &TaskBoard<MemoryStore>, scope: &Scope) -> Vec<String> {
    board
        .column(scope)
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect()
}

fn positions(board: &TaskBoard<MemoryStore>, scope: &Scope) -> Vec<u64> {
    board
        .column(scope)
        .unwrap()
        .into_iter()
        .map(|task| task.position)
        .collect()
}

#[test]
fn move_lands_at_every_requested_index() {
    for target in 0..5 {
        let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c", "d", "e"]);
        let scope = Scope::new(milestone, Some(TaskStatus::Todo));

        let outcome = board
            .move_task(&MoveRequest::within(ids[2].clone(), target as i64))
            .unwrap();

        assert_eq!(outcome.index, target);
        assert_eq!(outcome.column[target], ids[2]);
        let column = board.column(&scope).unwrap();
        assert_eq!(column[target].id, ids[2]);

        let others: Vec<String> = column
            .iter()
            .filter(|task| task.id != ids[2])
            .map(|task| task.title.clone())
            .collect();
        assert_eq!(others, vec!["a", "b", "d", "e"]);
    }
}

#[test]
fn repeated_front_moves_keep_positions_strictly_increasing() {
    let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c", "d"]);
    let scope = Scope::new(milestone, Some(TaskStatus::Todo));

    for round in 0..20 {
        let id = ids[round % ids.len()].clone();
        board.move_task(&MoveRequest::within(id, 0)).unwrap();
        let positions = positions(&board, &scope);
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn repeated_middle_moves_renumber_without_reordering_others() {
    let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c"]);
    let scope = Scope::new(milestone, Some(TaskStatus::Todo));

    let first = board.move_task(&MoveRequest::within(ids[2].clone(), 1)).unwrap();
    assert!(first.renumbered);
    assert_eq!(titles(&board, &scope), vec!["a", "c", "b"]);

    let second = board.move_task(&MoveRequest::within(ids[1].clone(), 1)).unwrap();
    assert!(!second.renumbered);
    assert_eq!(titles(&board, &scope), vec!["a", "b", "c"]);
}

#[test]
fn moving_to_current_index_changes_nothing() {
    let (board, _milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c"]);
    let before = board.task(&ids[1]).unwrap();

    let outcome = board.move_task(&MoveRequest::within(ids[1].clone(), 1)).unwrap();

    assert!(outcome.change.is_noop());
    assert_eq!(board.task(&ids[1]).unwrap().position, before.position);
}

#[test]
fn status_move_reshapes_both_columns() {
    let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c"]);
    let todo = Scope::new(milestone.clone(), Some(TaskStatus::Todo));
    let review = Scope::new(milestone, Some(TaskStatus::InReview));

    board
        .move_task(&MoveRequest::within(ids[0].clone(), 0).to_status(TaskStatus::InReview))
        .unwrap();
    board
        .move_task(&MoveRequest::within(ids[2].clone(), 0).to_status(TaskStatus::InReview))
        .unwrap();

    assert_eq!(titles(&board, &todo), vec!["b"]);
    assert_eq!(titles(&board, &review), vec!["c", "a"]);
}

#[test]
fn milestone_mode_ignores_status_for_order() {
    let (board, milestone, ids) = seeded(ScopeMode::Milestone, &["a", "b", "c"]);
    let scope = Scope::new(milestone, None);

    let outcome = board
        .move_task(&MoveRequest::within(ids[2].clone(), 0).to_status(TaskStatus::Completed))
        .unwrap();

    assert!(outcome.change.status_changed());
    assert_eq!(titles(&board, &scope), vec!["c", "a", "b"]);
}

#[test]
fn reorder_then_bulk_status_appends_to_destination() {
    let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b", "c"]);
    let todo = Scope::new(milestone.clone(), Some(TaskStatus::Todo));
    let done = Scope::new(milestone, Some(TaskStatus::Completed));

    board
        .reorder_scope(&todo, &[ids[2].clone(), ids[1].clone(), ids[0].clone()])
        .unwrap();
    assert_eq!(titles(&board, &todo), vec!["c", "b", "a"]);

    let outcome = board
        .apply_bulk_update(
            &[ids[0].clone(), ids[2].clone()],
            &BulkUpdate {
                status: Some(TaskStatus::Completed),
                priority: Some(Priority::High),
                milestone: None,
            },
        )
        .unwrap();

    assert_eq!(outcome.kind(), BulkResultKind::Complete);
    assert_eq!(titles(&board, &todo), vec!["b"]);
    assert_eq!(titles(&board, &done).len(), 2);
    let done_positions = positions(&board, &done);
    assert!(done_positions[0] < done_positions[1]);
    for id in [&ids[0], &ids[2]] {
        assert_eq!(board.task(id).unwrap().priority, Priority::High);
    }
}

#[test]
fn bulk_delete_takes_subtasks_along() {
    let (board, milestone, ids) = seeded(ScopeMode::Status, &["a", "b"]);
    let mut sub = NewTask::new("a.1", milestone);
    sub.parent = Some(ids[0].clone());
    let sub = board.create_task(sub).unwrap();

    let outcome = board.bulk_delete(&[ids[0].clone()]).unwrap();

    assert_eq!(outcome.succeeded, vec![ids[0].clone()]);
    assert!(board.task(&sub.id).is_err());
    assert!(board.task(&ids[1]).is_ok());
}

#[test]
fn bulk_milestone_move_appends_after_existing_tasks() {
    let (board, alpha, ids) = seeded(ScopeMode::Status, &["a1", "a2", "a3", "a4"]);
    let beta = board.add_milestone("p1", "Sprint 2").unwrap().id;
    for title in ["b1", "b2"] {
        board.create_task(NewTask::new(title, beta.clone())).unwrap();
    }
    let beta_todo = Scope::new(beta.clone(), Some(TaskStatus::Todo));
    let existing_max = *positions(&board, &beta_todo).last().unwrap();

    let outcome = board
        .apply_bulk_update(
            &[ids[2].clone(), ids[0].clone(), ids[3].clone()],
            &BulkUpdate {
                milestone: Some(beta.clone()),
                ..BulkUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(outcome.kind(), BulkResultKind::Complete);
    assert_eq!(titles(&board, &beta_todo), vec!["b1", "b2", "a3", "a1", "a4"]);
    let moved = positions(&board, &beta_todo);
    assert!(moved.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(moved[2..].iter().all(|position| *position > existing_max));
    assert_eq!(
        titles(&board, &Scope::new(alpha, Some(TaskStatus::Todo))),
        vec!["a2"]
    );
}
