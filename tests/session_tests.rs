use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use bandgap_viewer::analysis::gradient::gradient;
use bandgap_viewer::config::Session;
use bandgap_viewer::data::export::{export_analysis, write_second_derivative};
use bandgap_viewer::data::model::{SpectrumKind, SpectrumOrigin};

fn energies(start: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start + 0.1 * i as f64 + if i % 4 == 1 { 0.03 } else { 0.0 })
        .collect()
}

fn write_fixture(dir: &Path) {
    let xes_x = energies(520.0, 60);
    let mut xes = String::from("Ti3O5 O K XES\nenergy,XES\n");
    for e in &xes_x {
        xes.push_str(&format!("{e},{}\n", (-(e - 523.0).powi(2)).exp()));
    }
    fs::write(dir.join("exp_XES.csv"), xes).unwrap();

    // PFY is shorter than TEY: ragged columns.
    let xas_x = energies(528.0, 50);
    let mut xas = String::from("Ti3O5 O K XAS\nenergy,TEY,energy,PFY\n");
    for (i, e) in xas_x.iter().enumerate() {
        let tey = (-(e - 530.5).powi(2) / 0.5).exp();
        if i < 40 {
            xas.push_str(&format!("{e},{tey},{e},{}\n", 0.5 * tey));
        } else {
            xas.push_str(&format!("{e},{tey},,\n"));
        }
    }
    fs::write(dir.join("exp_XAS.csv"), xas).unwrap();

    let mut calc = String::from("energy;intensity\n");
    for e in energies(518.0, 30) {
        calc.push_str(&format!("{e};{}\n", e - 518.0));
    }
    fs::write(dir.join("calc_XES.csv"), calc).unwrap();

    let session = r#"{
        "loads": [
            { "origin": "experimental", "path": "exp_XES.csv", "kind": "xes", "names": ["XES"] },
            { "origin": "experimental", "path": "exp_XAS.csv", "kind": "xas", "names": ["TEY", "PFY"] },
            { "origin": "calculated", "path": "calc_XES.csv", "kind": "xes", "name": "XES calc", "sep": ";" }
        ],
        "smoothing": [
            { "kind": "xes", "name": "XES", "window": 7, "polyorder": 3, "onset_region": [522, 524] },
            { "kind": "xas", "name": "TEY", "window": 9, "polyorder": 2 },
            { "kind": "xas", "name": "PFY", "window": 9, "polyorder": 2 }
        ],
        "selection": { "xas_exp": ["PFY", "missing"] },
        "plot": { "title": "Ti3O5 Bandgap Analysis", "xes_xlims": [515, 535], "xas_xlims": [520, 540] }
    }"#;
    fs::write(dir.join("session.json"), session).unwrap();
}

#[test]
fn session_builds_store_with_processed_spectra() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());

    let session = Session::from_path(&tmp.path().join("session.json")).unwrap();
    let store = session.build_store(tmp.path()).unwrap();

    assert_eq!(store.len(), 4);
    assert_eq!(
        store.names(SpectrumKind::Xas, SpectrumOrigin::Experimental),
        vec!["PFY", "TEY"]
    );
    let pfy = store
        .get(SpectrumKind::Xas, SpectrumOrigin::Experimental, "PFY")
        .unwrap();
    assert_eq!(pfy.len(), 40);

    let calc = store
        .get(SpectrumKind::Xes, SpectrumOrigin::Calculated, "XES calc")
        .unwrap();
    assert_eq!(calc.len(), 30);
    assert_abs_diff_eq!(calc.y[10], calc.x[10] - 518.0, epsilon = 1e-12);

    let xes = store
        .get(SpectrumKind::Xes, SpectrumOrigin::Experimental, "XES")
        .unwrap();
    let done = store.processed(SpectrumKind::Xes, "XES").unwrap();
    assert_eq!(done.smoothed.len(), xes.len());
    assert_eq!(done.params.window, 7);
    let twice = gradient(&xes.x, &gradient(&xes.x, &done.smoothed).unwrap()).unwrap();
    assert_eq!(done.second_derivative, twice);

    assert_eq!(
        session
            .selection
            .resolve(SpectrumKind::Xas, SpectrumOrigin::Experimental, &store),
        vec!["PFY"]
    );
    assert_eq!(
        session
            .selection
            .resolve(SpectrumKind::Xes, SpectrumOrigin::Calculated, &store),
        vec!["XES calc"]
    );
    assert_eq!(session.plot.title.as_deref(), Some("Ti3O5 Bandgap Analysis"));
}

#[test]
fn export_is_deterministic_and_ordered() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let session = Session::from_path(&tmp.path().join("session.json")).unwrap();
    let store = session.build_store(tmp.path()).unwrap();

    let first = export_analysis(&tmp.path().join("out_a"), "Ti3O5", &store).unwrap();
    let second = export_analysis(&tmp.path().join("out_b"), "Ti3O5", &store).unwrap();
    assert_eq!(first.len(), 2);
    assert!(first[0].ends_with("Ti3O5_XES.csv"));
    assert!(first[1].ends_with("Ti3O5_XAS.csv"));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    let xas = fs::read_to_string(&first[1]).unwrap();
    let mut lines = xas.lines();
    assert_eq!(
        lines.next(),
        Some("name,energy,intensity,smoothed,second_derivative")
    );
    let names: Vec<&str> = lines.map(|l| l.split(',').next().unwrap_or("")).collect();
    assert_eq!(names.len(), 40 + 50);
    assert!(names[..40].iter().all(|n| *n == "PFY"));
    assert!(names[40..].iter().all(|n| *n == "TEY"));
}

#[test]
fn single_spectrum_table_follows_input_grid() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let session = Session::from_path(&tmp.path().join("session.json")).unwrap();
    let store = session.build_store(tmp.path()).unwrap();

    let xes = store
        .get(SpectrumKind::Xes, SpectrumOrigin::Experimental, "XES")
        .unwrap();
    let done = store.processed(SpectrumKind::Xes, "XES").unwrap();

    let mut buf = Vec::new();
    write_second_derivative(&mut buf, done, &xes.x).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let energies: Vec<f64> = text
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(energies, xes.x);
}

#[test]
fn bad_smoothing_job_names_the_spectrum() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let session_path = tmp.path().join("bad.json");
    fs::write(
        &session_path,
        r#"{ "loads": [ { "origin": "experimental", "path": "exp_XES.csv", "kind": "xes", "names": ["XES"] } ],
             "smoothing": [ { "kind": "xes", "name": "XES", "window": 6, "polyorder": 2 } ] }"#,
    )
    .unwrap();
    let session = Session::from_path(&session_path).unwrap();
    let err = session.build_store(tmp.path()).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("smoothing XES 'XES'"), "{msg}");
    assert!(msg.contains("window must be odd"), "{msg}");
}

#[test]
fn oversized_polyorder_in_session_is_rejected() {
    let tmp = TempDir::new().unwrap();
    write_fixture(tmp.path());
    let session_path = tmp.path().join("huge.json");
    fs::write(
        &session_path,
        r#"{ "loads": [ { "origin": "experimental", "path": "exp_XES.csv", "kind": "xes", "names": ["XES"] } ],
             "smoothing": [ { "kind": "xes", "name": "XES", "window": 3, "polyorder": 18446744073709551615 } ] }"#,
    )
    .unwrap();
    let session = Session::from_path(&session_path).unwrap();
    let err = session.build_store(tmp.path()).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("smoothing XES 'XES'"), "{msg}");
    assert!(msg.contains("must exceed polyorder + 1"), "{msg}");
}

#[test]
fn missing_file_is_reported_with_path() {
    let tmp = TempDir::new().unwrap();
    let session_path = tmp.path().join("s.json");
    fs::write(
        &session_path,
        r#"{ "loads": [ { "origin": "calculated", "path": "nope.csv", "kind": "xas", "name": "c" } ] }"#,
    )
    .unwrap();
    let session = Session::from_path(&session_path).unwrap();
    let err = session.build_store(tmp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("nope.csv"));
}
