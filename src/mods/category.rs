//! Routing tables: what a piece of content is and where it goes
//!
//! Every category the installer knows is described here as data. The
//! installer has one routine that resolves a [`Destination`] and places the
//! matched content according to its [`Placement`].

use super::ModType;

/// How a category is recognised in an unpacked source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// A file with exactly this name marks its directory
    File(&'static str),
    /// Any file with this extension marks its directory
    Extension(&'static str),
}

/// Where matched content lands, relative to the mods root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A constant directory
    Fixed(&'static str),
    /// `bikes/<bike>` for an installed bike picked by the user
    InstalledBike,
    /// `tracks/<folder>` for a track folder picked or named by the user
    TrackFolder,
}

/// How a matched directory is placed into its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The directory itself is copied, keeping its name
    Directory,
    /// Only the directory's children are copied
    Contents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub destination: Destination,
    pub placement: Placement,
    pub mod_type: ModType,
}

/// Content categories detected from file signatures, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Boots,
    Riders,
    Helmets,
    Bikes,
    Sound,
    Wheels,
    Tyres,
    Protections,
    Tracks,
}

struct CategoryRule {
    category: Category,
    signature: Signature,
    route: Route,
}

const fn rule(
    category: Category,
    signature: Signature,
    destination: Destination,
    placement: Placement,
    mod_type: ModType,
) -> CategoryRule {
    CategoryRule {
        category,
        signature,
        route: Route {
            destination,
            placement,
            mod_type,
        },
    }
}

/// Signature scans in the order they run. Order matters: later categories
/// decide the mod type when several match.
const CATEGORY_RULES: &[CategoryRule] = &[
    rule(Category::Boots, Signature::File("boots.edf"), Destination::Fixed("rider/boots"), Placement::Directory, ModType::Rider),
    rule(Category::Riders, Signature::File("rider.edf"), Destination::Fixed("rider/riders"), Placement::Directory, ModType::Rider),
    rule(Category::Helmets, Signature::File("helmet.edf"), Destination::Fixed("rider/helmets"), Placement::Directory, ModType::Rider),
    rule(Category::Bikes, Signature::File("model.edf"), Destination::InstalledBike, Placement::Contents, ModType::Bike),
    rule(Category::Sound, Signature::File("engine.scl"), Destination::InstalledBike, Placement::Contents, ModType::Bike),
    rule(Category::Wheels, Signature::File("p_mx.edf"), Destination::Fixed("tyres"), Placement::Directory, ModType::Bike),
    rule(Category::Tyres, Signature::Extension("tyre"), Destination::Fixed("tyres"), Placement::Directory, ModType::Bike),
    rule(Category::Protections, Signature::File("protection.edf"), Destination::Fixed("rider/protections"), Placement::Directory, ModType::Rider),
    rule(Category::Tracks, Signature::Extension("map"), Destination::TrackFolder, Placement::Directory, ModType::Track),
];

impl Category {
    /// All categories in scan order
    pub fn scan_order() -> impl Iterator<Item = Category> {
        CATEGORY_RULES.iter().map(|r| r.category)
    }

    fn rule(self) -> &'static CategoryRule {
        CATEGORY_RULES
            .iter()
            .find(|r| r.category == self)
            .unwrap_or(&CATEGORY_RULES[0])
    }

    pub fn signature(self) -> Signature {
        self.rule().signature
    }

    pub fn route(self) -> Route {
        self.rule().route
    }

    /// Whether a matched folder owns the paints below it. Wheel, tyre and
    /// track folders do not, so paints inside them still go to the paint
    /// sweep.
    pub fn owns_paints(self) -> bool {
        !matches!(self, Category::Wheels | Category::Tyres | Category::Tracks)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Boots => "boots",
            Category::Riders => "riders",
            Category::Helmets => "helmets",
            Category::Bikes => "bike models",
            Category::Sound => "sound mods",
            Category::Wheels => "wheels",
            Category::Tyres => "tyres",
            Category::Protections => "protections",
            Category::Tracks => "tracks",
        }
    }
}

/// Extension of signature files that did not match any known category
pub const EDF_EXTENSION: &str = "edf";
/// Extension of paint files swept after the category copies
pub const PAINT_EXTENSION: &str = "pnt";
/// Extension of packaged models swept last
pub const PACKAGE_EXTENSION: &str = "pkz";

/// Kinds the user can pick for content with no recognisable signature
/// (unmatched `.edf` folders and loose `.pkz` packages)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Helmets,
    Boots,
    Riders,
    Bikes,
    Tracks,
    Tyres,
    Protections,
    HelmetAddon,
}

impl ModelKind {
    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::Helmets,
            ModelKind::Boots,
            ModelKind::Riders,
            ModelKind::Bikes,
            ModelKind::Tracks,
            ModelKind::Tyres,
            ModelKind::Protections,
            ModelKind::HelmetAddon,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::Helmets => "helmets",
            ModelKind::Boots => "boots",
            ModelKind::Riders => "riders",
            ModelKind::Bikes => "bikes",
            ModelKind::Tracks => "tracks",
            ModelKind::Tyres => "tyres",
            ModelKind::Protections => "protections",
            ModelKind::HelmetAddon => "helmet addon",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.label() == label)
    }

    pub fn labels() -> Vec<String> {
        Self::all().iter().map(|k| k.label().to_string()).collect()
    }

    pub fn route(self) -> Route {
        let (destination, mod_type) = match self {
            ModelKind::Helmets => (Destination::Fixed("rider/helmets"), ModType::Rider),
            ModelKind::Boots => (Destination::Fixed("rider/boots"), ModType::Rider),
            ModelKind::Riders => (Destination::Fixed("rider/riders"), ModType::Rider),
            ModelKind::Bikes => (Destination::Fixed("bikes"), ModType::Bike),
            ModelKind::Tracks => (Destination::TrackFolder, ModType::Track),
            ModelKind::Tyres => (Destination::Fixed("tyres"), ModType::Bike),
            ModelKind::Protections => (Destination::Fixed("rider/protections"), ModType::Rider),
            ModelKind::HelmetAddon => (Destination::Fixed("rider/helmetcams"), ModType::Rider),
        };
        Route {
            destination,
            placement: Placement::Directory,
            mod_type,
        }
    }
}

/// Which entries of an owner directory count as installed instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSource {
    /// `.pkz` packages only (listed by stem)
    Packages,
    /// Sub-directories only
    Directories,
    /// Sub-directories and `.pkz` stems
    DirectoriesAndPackages,
}

/// Everything needed to route paints of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintRoute {
    /// Directory holding the installed instances, relative to the mods root
    pub owner_dir: &'static str,
    pub instances: InstanceSource,
    /// Sub-directory of the chosen instance receiving the paints
    pub subdir: &'static str,
    pub mod_type: ModType,
    pub prompt_title: &'static str,
    pub prompt_message: &'static str,
    /// Shown when nothing is installed to attach the paints to
    pub missing: &'static str,
}

/// What a set of `.pnt` files paints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintKind {
    Bikes,
    Helmets,
    Goggles,
    Boots,
    Gloves,
    Riders,
    Protections,
}

impl PaintKind {
    pub fn all() -> &'static [PaintKind] {
        &[
            PaintKind::Bikes,
            PaintKind::Helmets,
            PaintKind::Goggles,
            PaintKind::Boots,
            PaintKind::Gloves,
            PaintKind::Riders,
            PaintKind::Protections,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            PaintKind::Bikes => "bikes",
            PaintKind::Helmets => "helmets",
            PaintKind::Goggles => "goggles",
            PaintKind::Boots => "boots",
            PaintKind::Gloves => "gloves",
            PaintKind::Riders => "riders",
            PaintKind::Protections => "protections",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.label() == label)
    }

    pub fn labels() -> Vec<String> {
        Self::all().iter().map(|k| k.label().to_string()).collect()
    }

    pub fn route(self) -> PaintRoute {
        match self {
            PaintKind::Bikes => PaintRoute {
                owner_dir: "bikes",
                instances: InstanceSource::Packages,
                subdir: "paints",
                mod_type: ModType::Bike,
                prompt_title: "Select a bike",
                prompt_message: "What bike do these paints belong to?",
                missing: "Unable to install bike paints, no available bikes to install into",
            },
            PaintKind::Helmets => PaintRoute {
                owner_dir: "rider/helmets",
                instances: InstanceSource::DirectoriesAndPackages,
                subdir: "paints",
                mod_type: ModType::Rider,
                prompt_title: "Select a helmet",
                prompt_message: "Which helmet do these paints belong to?",
                missing: "No helmets installed, unable to install helmet paints",
            },
            PaintKind::Goggles => PaintRoute {
                owner_dir: "rider/helmets",
                instances: InstanceSource::DirectoriesAndPackages,
                subdir: "goggles",
                mod_type: ModType::Rider,
                prompt_title: "Select a helmet",
                prompt_message: "Which helmet are these goggles for?",
                missing: "No helmets installed, unable to install goggles",
            },
            PaintKind::Boots => PaintRoute {
                owner_dir: "rider/boots",
                instances: InstanceSource::DirectoriesAndPackages,
                subdir: "paints",
                mod_type: ModType::Rider,
                prompt_title: "Select a pair of boots",
                prompt_message: "Which boots do these paints belong to?",
                missing: "No boots installed, unable to install boot paints",
            },
            PaintKind::Gloves => PaintRoute {
                owner_dir: "rider/riders",
                instances: InstanceSource::Directories,
                subdir: "gloves",
                mod_type: ModType::Rider,
                prompt_title: "Select a rider",
                prompt_message: "Which rider do these gloves belong to?",
                missing: "No riders installed, unable to install gloves",
            },
            PaintKind::Riders => PaintRoute {
                owner_dir: "rider/riders",
                instances: InstanceSource::Directories,
                subdir: "paints",
                mod_type: ModType::Rider,
                prompt_title: "Select a rider",
                prompt_message: "Which rider do these paints belong to?",
                missing: "No riders installed, unable to install rider paints",
            },
            PaintKind::Protections => PaintRoute {
                owner_dir: "rider/protections",
                instances: InstanceSource::DirectoriesAndPackages,
                subdir: "paints",
                mod_type: ModType::Rider,
                prompt_title: "Select a protection",
                prompt_message: "Which protection are these paints for?",
                missing: "No protections installed, unable to install protection paints",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_order_is_fixed() {
        let order: Vec<Category> = Category::scan_order().collect();
        assert_eq!(
            order,
            vec![
                Category::Boots,
                Category::Riders,
                Category::Helmets,
                Category::Bikes,
                Category::Sound,
                Category::Wheels,
                Category::Tyres,
                Category::Protections,
                Category::Tracks,
            ]
        );
    }

    #[test]
    fn test_signatures() {
        assert_eq!(Category::Helmets.signature(), Signature::File("helmet.edf"));
        assert_eq!(Category::Wheels.signature(), Signature::File("p_mx.edf"));
        assert_eq!(Category::Tyres.signature(), Signature::Extension("tyre"));
        assert_eq!(Category::Tracks.signature(), Signature::Extension("map"));
    }

    #[test]
    fn test_sound_routes_into_an_installed_bike() {
        let route = Category::Sound.route();
        assert_eq!(route.destination, Destination::InstalledBike);
        assert_eq!(route.placement, Placement::Contents);
        assert_eq!(route.mod_type, ModType::Bike);
    }

    #[test]
    fn test_loose_content_does_not_own_paints() {
        assert!(Category::Helmets.owns_paints());
        assert!(Category::Bikes.owns_paints());
        assert!(!Category::Tyres.owns_paints());
        assert!(!Category::Wheels.owns_paints());
        assert!(!Category::Tracks.owns_paints());
    }

    #[test]
    fn test_kind_labels_round_trip() {
        for kind in ModelKind::all() {
            assert_eq!(ModelKind::from_label(kind.label()), Some(*kind));
        }
        for kind in PaintKind::all() {
            assert_eq!(PaintKind::from_label(kind.label()), Some(*kind));
        }
        assert_eq!(ModelKind::from_label("fonts"), None);
    }

    #[test]
    fn test_helmet_addon_goes_to_helmetcams() {
        assert_eq!(
            ModelKind::HelmetAddon.route().destination,
            Destination::Fixed("rider/helmetcams")
        );
        assert_eq!(PaintKind::Goggles.route().subdir, "goggles");
    }
}
