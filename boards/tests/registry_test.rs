use jvs_boards::registry;

#[test]
fn all_profiles_are_registered_and_sorted() {
    let entries = registry::all();
    assert!(entries.len() >= 5);

    let names: Vec<&str> = entries.iter().map(|e| e.name).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let mut deduped = sorted.clone();
    deduped.dedup();
    assert_eq!(sorted, deduped);
}

#[test]
fn find_resolves_known_names() {
    let entry = registry::find("sega-type-3").expect("sega-type-3 registered");
    let caps = (entry.create)();
    assert_eq!(caps.players, 2);
    assert_eq!(caps.analogue_in_channels, 8);
    assert_eq!(caps.analogue_in_bits, 10);
    assert!(caps.name.starts_with("SEGA ENTERPRISES"));

    assert!(registry::find("no-such-board").is_none());
}

#[test]
fn gun_boards_advertise_gun_channels() {
    let tss = (registry::find("namco-tss").unwrap().create)();
    assert_eq!(tss.gun_channels, 1);
    assert_eq!(tss.gun_x_bits, 16);
    assert_eq!(tss.gun_y_bits, 16);

    let jyu = (registry::find("namco-jyu").unwrap().create)();
    assert_eq!(jyu.gun_channels, 2);
}

#[test]
fn identity_strings_fit_the_wire_limit() {
    for entry in registry::all() {
        let caps = (entry.create)();
        assert!(caps.name.len() <= 100, "{} id string too long", entry.name);
        assert!(caps.name.is_ascii());
    }
}
