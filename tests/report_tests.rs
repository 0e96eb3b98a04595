use workload_journal::report::{hours_by_discipline, monthly_frame, season_frame};
use workload_journal::{
    EntryTemplate, GridStore, Hours, LedgerCoordinator, LoadType, MonthlyRecord, Workbook,
};

fn record(day: u32, discipline: &str, group: &str, hours: Hours) -> MonthlyRecord {
    MonthlyRecord {
        row: 6 + day,
        day,
        discipline: discipline.to_string(),
        group: group.to_string(),
        load_type: LoadType::Basic.as_str().to_string(),
        hours,
    }
}

#[test]
fn monthly_frame_has_one_row_per_record() {
    let records = vec![
        record(1, "Algebra", "101", Hours::lecture(2.0)),
        record(2, "Physics", "102", Hours::lab(1.0)),
    ];
    let df = monthly_frame(&records).unwrap();
    assert_eq!(df.height(), 2);
    let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
    assert_eq!(
        names,
        vec!["row", "day", "discipline", "group", "load_type", "lecture", "practice", "lab"]
    );
    let lecture = df.column("lecture").unwrap().f64().unwrap();
    assert_eq!(lecture.get(0), Some(2.0));
    assert_eq!(lecture.get(1), None);
}

#[test]
fn totals_are_summed_per_discipline_and_group() {
    let records = vec![
        record(3, "Physics", "102", Hours::lab(1.0)),
        record(1, "Algebra", "101", Hours::lecture(2.0)),
        record(2, "Algebra", "101", Hours::new(2.0, 3.0, 0.0)),
        record(4, "Algebra", "102", Hours::practice(1.0)),
    ];
    let df = hours_by_discipline(&monthly_frame(&records).unwrap()).unwrap();
    assert_eq!(df.height(), 3);

    let discipline = df.column("discipline").unwrap().str().unwrap();
    let group = df.column("group").unwrap().str().unwrap();
    let lecture = df.column("lecture").unwrap().f64().unwrap();
    let total = df.column("total").unwrap().f64().unwrap();

    assert_eq!(discipline.get(0), Some("Algebra"));
    assert_eq!(group.get(0), Some("101"));
    assert_eq!(lecture.get(0), Some(4.0));
    assert_eq!(total.get(0), Some(7.0));

    assert_eq!(group.get(1), Some("102"));
    assert_eq!(total.get(1), Some(1.0));

    assert_eq!(discipline.get(2), Some("Physics"));
    assert_eq!(lecture.get(2), Some(0.0));
    assert_eq!(total.get(2), Some(1.0));
}

#[test]
fn season_frame_reflects_aggregates() {
    let coordinator = LedgerCoordinator::default();
    let mut wb = Workbook::academic_year("осень", "весна");
    let dates: Vec<_> = [(2024, 9, 2), (2024, 10, 7)]
        .into_iter()
        .filter_map(|(y, m, d)| chrono::NaiveDate::from_ymd_opt(y, m, d))
        .filter_map(|date| coordinator.calendar().occurrence(date, &wb.sheet_names()))
        .collect();
    let template = EntryTemplate::new("Algebra", "101", LoadType::Hourly, Hours::lecture(2.0));
    coordinator.add_intent(&mut wb, &dates, &template).unwrap();

    let entries = coordinator.season().read_all(&wb, "осень").unwrap();
    let df = season_frame(&entries).unwrap();
    assert_eq!(df.height(), 1);
    let load_type = df.column("load_type").unwrap().str().unwrap();
    assert_eq!(load_type.get(0), Some("почас."));
    let row = df.column("row").unwrap().i32().unwrap();
    assert_eq!(row.get(0), Some(5));
}

#[test]
fn empty_input_gives_empty_frames() {
    let df = monthly_frame(&[]).unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(hours_by_discipline(&df).unwrap().height(), 0);
}
