/// Demo seed data
///
/// The fixed subject set the site ships with: the two parents and nine
/// puppies. Reset reinstalls it; first-run seeding installs it into an
/// empty catalog.
use crate::error::Result;
use crate::state::catalog::{Catalog, NewSubject};
use crate::state::data::SubjectKind;

/// Build one seed subject with photos /dogs/<folder>/image1.jpg ..
/// imageN.jpg
fn seed_subject(name: &str, kind: SubjectKind, folder: &str, photos: u32, is_sold: bool) -> NewSubject {
    NewSubject {
        name: name.to_string(),
        kind,
        images: (1..=photos)
            .map(|n| format!("/dogs/{}/image{}.jpg", folder, n))
            .collect(),
        is_sold,
    }
}

/// The full seed set, in insertion order
pub fn seed_subjects() -> Vec<NewSubject> {
    use SubjectKind::{Dam, Puppy, Sire};

    vec![
        seed_subject("Queenie", Dam, "dam", 6, false),
        seed_subject("King", Sire, "sire", 4, false),
        seed_subject("Gray", Puppy, "gray", 2, false),
        seed_subject("Red", Puppy, "red", 1, false),
        seed_subject("Blue", Puppy, "blue", 1, false),
        seed_subject("Sky", Puppy, "sky", 1, false),
        seed_subject("Fuchsia", Puppy, "fuchsia", 1, false),
        seed_subject("Yellow", Puppy, "yellow", 1, false),
        seed_subject("Green", Puppy, "green", 1, true),
        seed_subject("Pink", Puppy, "pink", 1, true),
        seed_subject("Violet", Puppy, "violet", 1, false),
    ]
}

/// Throw away every subject and reinstall the seed set.
///
/// Runs inside a single transaction: a failure part-way through leaves
/// the previous catalog contents in place, never an empty store.
pub fn reset_to_seed(catalog: &mut Catalog) -> Result<()> {
    catalog.replace_all_subjects(&seed_subjects())
}

/// Install the seed set only if the catalog is empty. Returns whether
/// anything was installed. The public listing runs this first so a
/// fresh database serves the demo data.
pub fn ensure_seeded(catalog: &mut Catalog) -> Result<bool> {
    if catalog.subject_count()? > 0 {
        return Ok(false);
    }

    reset_to_seed(catalog)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_catalog(dir: &TempDir) -> Catalog {
        Catalog::open(&dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn test_seed_shape() {
        let seed = seed_subjects();
        assert_eq!(seed.len(), 11);

        let queenie = &seed[0];
        assert_eq!(queenie.kind, SubjectKind::Dam);
        assert_eq!(queenie.images.len(), 6);
        assert_eq!(queenie.images[0], "/dogs/dam/image1.jpg");
        assert_eq!(queenie.images[5], "/dogs/dam/image6.jpg");

        let sold: Vec<&str> = seed
            .iter()
            .filter(|s| s.is_sold)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(sold, vec!["Green", "Pink"]);
    }

    #[test]
    fn test_reset_replaces_modified_state() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open_catalog(&dir);

        catalog
            .add_puppy("Intruder", &["/dogs/intruder/image1.jpg".to_string()])
            .unwrap();

        reset_to_seed(&mut catalog).unwrap();

        assert_eq!(catalog.subject_count().unwrap(), 11);
        assert!(catalog.puppy_by_name("Intruder").unwrap().is_none());

        let gray = catalog.puppy_by_name("Gray").unwrap().unwrap();
        assert_eq!(gray.images.len(), 2);
        assert!(catalog.puppy_by_name("Green").unwrap().unwrap().is_sold);

        let dam = catalog.parent(SubjectKind::Dam).unwrap().unwrap();
        assert_eq!(dam.name, "Queenie");
    }

    #[test]
    fn test_ensure_seeded_only_fills_an_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open_catalog(&dir);

        assert!(ensure_seeded(&mut catalog).unwrap());
        assert_eq!(catalog.subject_count().unwrap(), 11);

        // Second call must leave admin changes alone
        let id = catalog.puppy_by_name("Red").unwrap().unwrap().id;
        catalog.set_sold(id, true).unwrap();

        assert!(!ensure_seeded(&mut catalog).unwrap());
        assert!(catalog.puppy_by_name("Red").unwrap().unwrap().is_sold);
    }
}
