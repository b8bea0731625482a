//! Path classification into upload ordering classes

use crate::types::{HOMEPAGE_PATH, PathClass, PathSet};
use serde::{Deserialize, Serialize};

/// A path set partitioned by ordering class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPaths {
    /// Anything not ending in `.html`
    pub assets: PathSet,
    /// `.html` documents other than the homepage
    pub pages: PathSet,
    /// The root `index.html`, if present
    pub homepage: PathSet,
}

impl ClassifiedPaths {
    /// Paths of one class
    pub fn get(&self, class: PathClass) -> Option<&PathSet> {
        match class {
            PathClass::Assets => Some(&self.assets),
            PathClass::Pages => Some(&self.pages),
            PathClass::Homepage => Some(&self.homepage),
            PathClass::Manifest | PathClass::All => None,
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len() + self.pages.len() + self.homepage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordering class of a single path
pub fn class_of(path: &str) -> PathClass {
    if !path.ends_with(".html") {
        PathClass::Assets
    } else if path == HOMEPAGE_PATH {
        PathClass::Homepage
    } else {
        PathClass::Pages
    }
}

/// Partition a path set into assets, pages and homepage
pub fn classify(paths: &PathSet) -> ClassifiedPaths {
    let mut classified = ClassifiedPaths::default();
    for path in paths.iter() {
        let bucket = match class_of(path) {
            PathClass::Homepage => &mut classified.homepage,
            PathClass::Pages => &mut classified.pages,
            _ => &mut classified.assets,
        };
        bucket.insert(path);
    }
    classified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_of() {
        assert_eq!(class_of("./index.html"), PathClass::Homepage);
        assert_eq!(class_of("./about/index.html"), PathClass::Pages);
        assert_eq!(class_of("./post.html"), PathClass::Pages);
        assert_eq!(class_of("./site.css"), PathClass::Assets);
        assert_eq!(class_of("./page.HTML"), PathClass::Assets);
        // No leading `./`, so not the canonical homepage
        assert_eq!(class_of("index.html"), PathClass::Pages);
    }

    #[test]
    fn test_classify_empty() {
        let classified = classify(&PathSet::new());
        assert!(classified.assets.is_empty());
        assert!(classified.pages.is_empty());
        assert!(classified.homepage.is_empty());
    }

    #[test]
    fn test_classify_partitions_input() {
        let paths: PathSet = [
            "./index.html",
            "./blog/index.html",
            "./blog/first.html",
            "./img/logo.png",
            "./css/site.css",
            "./robots.txt",
        ]
        .into_iter()
        .collect();

        let classified = classify(&paths);
        assert_eq!(classified.homepage, ["./index.html"].into_iter().collect());
        assert_eq!(classified.pages.len(), 2);
        assert_eq!(classified.assets.len(), 3);

        assert!(classified.assets.is_disjoint(&classified.pages));
        assert!(classified.assets.is_disjoint(&classified.homepage));
        assert!(classified.pages.is_disjoint(&classified.homepage));

        let mut union = PathSet::new();
        union.extend_from(&classified.assets);
        union.extend_from(&classified.pages);
        union.extend_from(&classified.homepage);
        assert_eq!(union, paths);
        assert_eq!(classified.len(), paths.len());
    }

    #[test]
    fn test_get_by_class() {
        let paths: PathSet = ["./index.html", "./a.js"].into_iter().collect();
        let classified = classify(&paths);
        assert_eq!(classified.get(PathClass::Assets).map(PathSet::len), Some(1));
        assert_eq!(classified.get(PathClass::Homepage).map(PathSet::len), Some(1));
        assert!(classified.get(PathClass::Manifest).is_none());
    }
}
