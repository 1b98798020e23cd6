//! Test assembly enumeration against reference catalogs and hand-enumerated
//! expectations.

use std::{collections::BTreeSet, path::Path};

use proptest::prelude::*;

use moclo_assembly::{
    enumerate::{enumerate_with, EndPolicy, Query, SearchConfig, SearchMode},
    loader::{parse_catalog, parse_catalog_str},
    render::{PathLibrary, Renderer},
    validate_all, Assembly, Catalog, Part,
};

fn load_reference() -> Catalog {
    let path = Path::new("data").join("moclo_parts.csv");
    parse_catalog(&path).expect("data/moclo_parts.csv should load")
}

fn catalog(parts: &[(&str, &str, &str)]) -> Catalog {
    Catalog::new(
        parts
            .iter()
            .map(|(id, l, r)| Part::new(*id, l.parse().unwrap(), r.parse().unwrap()).unwrap())
            .collect(),
    )
    .unwrap()
}

fn ids(catalog: &Catalog, assemblies: &[Assembly]) -> Vec<Vec<String>> {
    assemblies
        .iter()
        .map(|a| a.ids(catalog).into_iter().map(str::to_string).collect())
        .collect()
}

fn search(catalog: &Catalog, start: &str, end: &str, config: &SearchConfig) -> Vec<Assembly> {
    let query = Query::parse(start, end).unwrap();
    enumerate_with(catalog, &query, config).unwrap()
}

/// Sort by length, then by id sequence, for order-insensitive comparison.
fn canonical(mut found: Vec<Vec<String>>) -> Vec<Vec<String>> {
    found.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    found
}

fn expect(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn reference_catalog_sorted_output() {
    let catalog = load_reference();
    let found = search(&catalog, "GGAG", "CGCT", &SearchConfig::default().sorted());
    assert_eq!(
        ids(&catalog, &found),
        expect(&[
            &["proRBS_pTet", "cdsTer_lacZ"],
            &["pro_J23100", "rbs_B0034", "cdsTer_lacZ"],
            &["pro_J23106", "rbs_B0034", "cdsTer_lacZ"],
            &["proRBS_pTet", "cds_GFP", "ter_B0015"],
            &["pro_J23100", "rbs_B0034", "cds_GFP", "ter_B0015"],
            &["pro_J23106", "rbs_B0034", "cds_GFP", "ter_B0015"],
            &["proRBS_pTet", "cds_sigpep", "cds_RFP", "ter_B0015"],
            &["pro_J23100", "rbs_B0034", "cds_sigpep", "cds_RFP", "ter_B0015"],
            &["pro_J23106", "rbs_B0034", "cds_sigpep", "cds_RFP", "ter_B0015"],
        ])
    );
}

#[test]
fn reference_catalog_invariants() {
    let catalog = load_reference();
    let query = Query::parse("GGAG", "CGCT").unwrap();
    for mode in [SearchMode::Recursive, SearchMode::Iterative] {
        let config = SearchConfig::default().with_mode(mode);
        let found = enumerate_with(&catalog, &query, &config).unwrap();
        assert_eq!(found.len(), 9);
        validate_all(&catalog, &query, EndPolicy::StopAtFirstMatch, &found).unwrap();
    }
}

#[test]
fn reference_catalog_renders() {
    let catalog = load_reference();
    let library = PathLibrary::from_glyph_dir(&Path::new("data").join("sbol")).unwrap();
    let template = |name: &str| {
        std::fs::read_to_string(Path::new("data").join("templates").join(name)).unwrap()
    };
    let renderer = Renderer::new(
        library,
        template("template_overhangs.svg"),
        template("template_box.svg"),
    );

    let promoter = &catalog[0];
    let svg = renderer.render_overhangs(promoter).unwrap();
    assert!(svg.contains(">GGAG<"));
    assert!(svg.contains(">CTCC<"));
    assert!(svg.contains(">TACT<"));
    assert!(svg.contains(">AGTA<"));
    assert!(svg.contains("fill=\"#e41a1c\""));
    assert!(svg.contains("id=\"inline-promoter\""));
    assert!(!svg.contains("{{"));

    for part in &catalog {
        let svg = renderer.render_box(part).unwrap();
        assert!(svg.contains(part.color().unwrap().as_str()));
    }
}

#[test]
fn example_from_two_routes() {
    let c = catalog(&[
        ("A", "GGAG", "AATG"),
        ("B", "AATG", "CGCT"),
        ("C", "GGAG", "CGCT"),
    ]);
    let found = search(&c, "GGAG", "CGCT", &SearchConfig::default().sorted());
    assert_eq!(ids(&c, &found), expect(&[&["C"], &["A", "B"]]));
}

#[test]
fn completeness_small_catalog() {
    // Two routes into AATG, a loop at AATG, and two ways out to CGCT.
    let c = catalog(&[
        ("p1", "GGAG", "AATG"),
        ("p2", "GGAG", "TACT"),
        ("r1", "TACT", "AATG"),
        ("loop", "AATG", "AATG"),
        ("c1", "AATG", "CGCT"),
        ("c2", "AATG", "GCTT"),
    ]);
    let found = search(&c, "GGAG", "CGCT", &SearchConfig::default());
    assert_eq!(
        canonical(ids(&c, &found)),
        expect(&[
            &["p1", "c1"],
            &["p1", "loop", "c1"],
            &["p2", "r1", "c1"],
            &["p2", "r1", "loop", "c1"],
        ])
    );
}

#[test]
fn empty_when_nothing_starts() {
    let c = catalog(&[("A", "AATG", "CGCT"), ("B", "CGCT", "GGAG")]);
    assert!(search(&c, "TACT", "CGCT", &SearchConfig::default()).is_empty());
    assert!(search(&Catalog::default(), "GGAG", "CGCT", &SearchConfig::default()).is_empty());
}

#[test]
fn single_part_closure() {
    let c = catalog(&[("only", "GGAG", "CGCT")]);
    let found = search(&c, "GGAG", "CGCT", &SearchConfig::default());
    assert_eq!(ids(&c, &found), expect(&[&["only"]]));
}

#[test]
fn self_loop_when_start_is_end() {
    let c = catalog(&[("ring", "GGAG", "GGAG"), ("A", "GGAG", "AATG"), ("B", "AATG", "GGAG")]);
    let found = search(&c, "GGAG", "GGAG", &SearchConfig::default());
    assert_eq!(ids(&c, &found), expect(&[&["ring"], &["A", "B"]]));
}

#[test]
fn parallel_edges_are_distinct() {
    let c = catalog(&[("x", "GGAG", "CGCT"), ("y", "GGAG", "CGCT")]);
    let found = search(&c, "GGAG", "CGCT", &SearchConfig::default());
    assert_eq!(ids(&c, &found), expect(&[&["x"], &["y"]]));
}

#[test]
fn idempotent() {
    let catalog = load_reference();
    let config = SearchConfig::default();
    let first = search(&catalog, "GGAG", "CGCT", &config);
    let second = search(&catalog, "GGAG", "CGCT", &config);
    assert_eq!(first, second);
}

#[test]
fn pass_through_is_superset() {
    let csv = "\
id,left_overhang,right_overhang
a,GGAG,CGCT
b,CGCT,AATG
c,AATG,CGCT
";
    let c = parse_catalog_str(csv).unwrap();
    let stop = search(&c, "GGAG", "CGCT", &SearchConfig::default());
    let through = search(
        &c,
        "GGAG",
        "CGCT",
        &SearchConfig::default().with_policy(EndPolicy::AllowPassThrough),
    );
    assert_eq!(ids(&c, &stop), expect(&[&["a"]]));
    assert_eq!(ids(&c, &through), expect(&[&["a"], &["a", "b", "c"]]));
}

const TAGS: [&str; 4] = ["GGAG", "AATG", "GCTT", "CGCT"];

/// Every ordered selection of distinct parts that satisfies the assembly
/// definition directly, without any search.
fn brute_force(catalog: &Catalog, start: &str, end: &str) -> BTreeSet<Vec<String>> {
    fn extend(
        catalog: &Catalog,
        prefix: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        out.push(prefix.clone());
        for ix in 0..catalog.len() {
            if !prefix.contains(&ix) {
                prefix.push(ix);
                extend(catalog, prefix, out);
                prefix.pop();
            }
        }
    }

    let mut sequences = Vec::new();
    extend(catalog, &mut Vec::new(), &mut sequences);

    sequences
        .into_iter()
        .filter(|seq| {
            let parts: Vec<&Part> = seq.iter().map(|&ix| &catalog[ix]).collect();
            let Some(first) = parts.first() else {
                return false;
            };
            let chained = parts
                .windows(2)
                .all(|w| w[0].right_overhang() == w[1].left_overhang());
            let ends: Vec<bool> = parts.iter().map(|p| p.right_overhang().as_str() == end).collect();
            first.left_overhang().as_str() == start
                && chained
                && ends.last() == Some(&true)
                && !ends[..ends.len() - 1].contains(&true)
        })
        .map(|seq| seq.iter().map(|&ix| catalog[ix].id().to_string()).collect())
        .collect()
}

fn arb_catalog() -> impl Strategy<Value = Catalog> {
    prop::collection::vec((0..TAGS.len(), 0..TAGS.len()), 0..=6).prop_map(|edges| {
        Catalog::new(
            edges
                .into_iter()
                .enumerate()
                .map(|(i, (l, r))| {
                    Part::new(format!("p{i}"), TAGS[l].parse().unwrap(), TAGS[r].parse().unwrap())
                        .unwrap()
                })
                .collect(),
        )
        .unwrap()
    })
}

proptest! {
    #[test]
    fn matches_brute_force(c in arb_catalog(), s in 0..TAGS.len(), e in 0..TAGS.len()) {
        let query = Query::parse(TAGS[s], TAGS[e]).unwrap();
        let recursive = enumerate_with(&c, &query, &SearchConfig::default()).unwrap();
        let iterative = enumerate_with(
            &c,
            &query,
            &SearchConfig::default().with_mode(SearchMode::Iterative),
        )
        .unwrap();

        prop_assert_eq!(&recursive, &iterative);
        prop_assert!(validate_all(&c, &query, EndPolicy::StopAtFirstMatch, &recursive).is_ok());

        let found: Vec<Vec<String>> = ids(&c, &recursive);
        let unique: BTreeSet<Vec<String>> = found.iter().cloned().collect();
        prop_assert_eq!(unique.len(), found.len());
        prop_assert_eq!(unique, brute_force(&c, TAGS[s], TAGS[e]));
    }
}
