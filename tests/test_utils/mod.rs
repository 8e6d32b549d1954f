#![allow(dead_code)]

use small_rel::{row, IndexKind, Table};

pub fn setup() {
    small_rel::utils::init_log();
}

/// The movie relation from the data-model textbook example.
pub fn movie_table(kind: IndexKind) -> Table {
    let mut movie = Table::with_index(
        "movie",
        "title year length genre studioName producerNo",
        "String Integer Integer String String Integer",
        "title year",
        kind,
    )
    .unwrap();

    assert!(movie.insert(row!["Star_Wars", 1977, 124, "sciFi", "Fox", 12345]));
    assert!(movie.insert(row!["Star_Wars_2", 1980, 124, "sciFi", "Fox", 12345]));
    assert!(movie.insert(row!["Rocky", 1985, 200, "action", "Universal", 12125]));
    assert!(movie.insert(row!["Rambo", 1978, 100, "action", "Universal", 32355]));
    movie
}

/// Same schema as the movie relation, overlapping on Rocky and Rambo.
pub fn cinema_table(kind: IndexKind) -> Table {
    let mut cinema = Table::with_index(
        "cinema",
        "title year length genre studioName producerNo",
        "String Integer Integer String String Integer",
        "title year",
        kind,
    )
    .unwrap();

    assert!(cinema.insert(row!["Rocky", 1985, 200, "action", "Universal", 12125]));
    assert!(cinema.insert(row!["Rambo", 1978, 100, "action", "Universal", 32355]));
    assert!(cinema.insert(row!["Galaxy_Quest", 1999, 104, "comedy", "DreamWorks", 67890]));
    cinema
}

pub fn studio_table(kind: IndexKind) -> Table {
    let mut studio = Table::with_index(
        "studio",
        "name address presNo",
        "String String Integer",
        "name",
        kind,
    )
    .unwrap();

    assert!(studio.insert(row!["Fox", "Los_Angeles", 7777]));
    assert!(studio.insert(row!["Universal", "Universal_City", 8888]));
    assert!(studio.insert(row!["DreamWorks", "Universal_City", 9999]));
    studio
}
