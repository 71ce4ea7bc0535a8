use harmony_core::db::open_db_in_memory;
use harmony_core::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use harmony_core::repo::habit_repo::{HabitRepository, SqliteHabitRepository};
use harmony_core::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use harmony_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use harmony_core::{ChangeEvent, ChangeService, Goal, Habit, Project, Task, TaskStatus};
use rusqlite::Connection;

fn seed_task_chain(conn: &Connection) -> (i64, i64, i64) {
    let goals = SqliteGoalRepository::new(conn);
    let projects = SqliteProjectRepository::new(conn);
    let tasks = SqliteTaskRepository::new(conn);

    let goal_id = goals.create_goal(&Goal::new("declutter the house")).unwrap();

    let mut project = Project::new("garage cleanup");
    project.goal_id = Some(goal_id);
    let project_id = projects.create_project(&project).unwrap();

    let mut done_task = Task::new("sort tools");
    done_task.project_id = Some(project_id);
    let done_task_id = tasks.create_task(&done_task).unwrap();
    tasks.set_status(done_task_id, TaskStatus::Done).unwrap();

    let mut open_task = Task::new("donate duplicates");
    open_task.project_id = Some(project_id);
    tasks.create_task(&open_task).unwrap();

    (goal_id, project_id, done_task_id)
}

#[test]
fn task_status_change_refreshes_project_and_goal_progress() {
    let conn = open_db_in_memory().unwrap();
    let (goal_id, project_id, task_id) = seed_task_chain(&conn);
    let service = ChangeService::new(&conn);

    let adjustments = vec!["Update the parent project's progress".to_string()];
    let report = service.apply_adjustments(
        &ChangeEvent::new("task_status_changed", task_id),
        &adjustments,
    );

    assert!(report.success);
    assert_eq!(report.applied, adjustments);
    assert_eq!(report.records_touched, 2);

    let project = SqliteProjectRepository::new(&conn)
        .get_project(project_id)
        .unwrap()
        .unwrap();
    assert_eq!(project.progress, 50);

    let goal = SqliteGoalRepository::new(&conn)
        .get_goal(goal_id)
        .unwrap()
        .unwrap();
    assert_eq!(goal.progress, 50);
}

#[test]
fn project_change_refreshes_goal_progress() {
    let conn = open_db_in_memory().unwrap();
    let (goal_id, project_id, _) = seed_task_chain(&conn);
    let projects = SqliteProjectRepository::new(&conn);
    projects.set_progress(project_id, 90).unwrap();

    let service = ChangeService::new(&conn);
    let report = service.apply_adjustments(
        &ChangeEvent::new("project_progress_changed", project_id),
        &[],
    );

    assert!(report.success);
    assert_eq!(report.records_touched, 1);
    let goal = SqliteGoalRepository::new(&conn)
        .get_goal(goal_id)
        .unwrap()
        .unwrap();
    assert_eq!(goal.progress, 90);
}

#[test]
fn goal_progress_change_keeps_the_users_edit() {
    let conn = open_db_in_memory().unwrap();
    let (goal_id, _, _) = seed_task_chain(&conn);
    let goals = SqliteGoalRepository::new(&conn);
    // The user dialed the goal to 80 by hand; its only project sits at 0.
    goals.set_progress(goal_id, 80).unwrap();

    let service = ChangeService::new(&conn);
    let report =
        service.apply_adjustments(&ChangeEvent::new("goal_progress_changed", goal_id), &[]);

    assert!(report.success);
    assert_eq!(report.records_touched, 1);
    let goal = goals.get_goal(goal_id).unwrap().unwrap();
    assert_eq!(goal.progress, 80);
}

#[test]
fn habit_completed_increments_streak() {
    let conn = open_db_in_memory().unwrap();
    let habits = SqliteHabitRepository::new(&conn);
    let habit_id = habits.create_habit(&Habit::new("morning run")).unwrap();

    let service = ChangeService::new(&conn);
    let report =
        service.apply_adjustments(&ChangeEvent::new("habit_completed", habit_id), &[]);
    assert!(report.success);
    assert_eq!(report.records_touched, 1);

    let habit = habits.get_habit(habit_id).unwrap().unwrap();
    assert_eq!(habit.streak, 1);
    assert!(habit.last_completed.is_some());

    let report = service.apply_adjustments(&ChangeEvent::new("habit_missed", habit_id), &[]);
    assert!(report.success);
    assert_eq!(habits.get_habit(habit_id).unwrap().unwrap().streak, 0);
}

#[test]
fn unknown_tag_succeeds_and_echoes_adjustments() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::new(&conn);

    let adjustments = vec![
        "Review recently edited areas for knock-on effects".to_string(),
        "Nothing else to do".to_string(),
    ];
    let report = service.apply_adjustments(
        &ChangeEvent::new("totally_unknown_tag", 1),
        &adjustments,
    );

    assert!(report.success);
    assert_eq!(report.applied, adjustments);
    assert_eq!(report.records_touched, 0);
}

#[test]
fn missing_record_is_a_no_op_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let service = ChangeService::new(&conn);

    let report = service.apply_adjustments(&ChangeEvent::new("task_status_changed", 9_999), &[]);
    assert!(report.success);
    assert_eq!(report.records_touched, 0);
}

#[test]
fn analyze_and_apply_runs_end_to_end() {
    let conn = open_db_in_memory().unwrap();
    let (_, project_id, task_id) = seed_task_chain(&conn);
    let service = ChangeService::new(&conn);

    let (analysis, report) =
        service.analyze_and_apply(&ChangeEvent::new("task_status_changed", task_id));

    assert_eq!(analysis.affected_entities, ["project", "goals", "journal"]);
    assert!(report.success);
    assert_eq!(report.applied, analysis.suggested_adjustments);

    let project = SqliteProjectRepository::new(&conn)
        .get_project(project_id)
        .unwrap()
        .unwrap();
    assert_eq!(project.progress, 50);
}
