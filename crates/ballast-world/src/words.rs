//! Embedded word lists for the catalog generator.

pub(crate) const COLORS: &[&str] = &[
    "amber", "aquamarine", "cerulean", "chartreuse", "cobalt", "crimson", "ecru", "fuchsia",
    "gunmetal", "indigo", "ivory", "jade", "lavender", "magenta", "mauve", "ochre", "periwinkle",
    "russet", "saffron", "scarlet", "sepia", "teal", "ultramarine", "vermilion", "viridian",
];

pub(crate) const SUBSTANCES: &[&str] = &[
    "alabaster", "bakelite", "bone", "brass", "ceramic", "chrome", "copper", "coral", "enamel",
    "felt", "glass", "jet", "lacquer", "latex", "marble", "obsidian", "onyx", "pewter", "resin",
    "soapstone", "tin", "velvet", "vinyl", "wax",
];

pub(crate) const ADJECTIVES: &[&str] = &[
    "ancient", "baroque", "battered", "delicate", "elegant", "enormous", "exquisite", "faded",
    "gaudy", "glowing", "humble", "intricate", "lopsided", "luminous", "ornate", "petite",
    "polished", "rustic", "sinister", "tiny", "unremarkable", "whimsical",
];

pub(crate) const TALISMANS: &[&str] = &[
    "amulet", "bangle", "brooch", "charm", "figurine", "idol", "locket", "medallion", "netsuke",
    "orb", "pendant", "reliquary", "ring", "scarab", "sigil", "snow globe", "statuette", "token",
    "totem", "trinket",
];

pub(crate) const ARTWORKS: &[&str] = &[
    "assemblage", "bas-relief", "collage", "diorama", "fresco", "installation", "mobile",
    "mosaic", "sculpture", "tapestry", "triptych", "woodcut",
];

pub(crate) const ART_TITLES: &[&str] = &[
    "autumnal", "broken", "celestial", "distant", "drowned", "electric", "eternal", "forgotten",
    "hollow", "infinite", "midnight", "silent", "sunken", "velvet", "weeping",
];

pub(crate) const ART_TITLES_TWO: &[&str] = &[
    "anchor", "cathedral", "echo", "garden", "harbor", "horizon", "lantern", "lighthouse",
    "meridian", "orchard", "reverie", "tide", "vessel", "voyage",
];

pub(crate) const SKILLS: &[&str] = &[
    "brushwork", "chiaroscuro", "composition", "craftsmanship", "draughtsmanship", "restraint",
    "symmetry", "technique", "texture", "vision",
];

pub(crate) const ART_VERBS: &[&str] = &[
    "confronts", "deconstructs", "evokes", "interrogates", "meditates on", "problematizes",
    "reimagines", "subverts", "transcends", "whispers of",
];

pub(crate) const THEMES: &[&str] = &[
    "the burden of possession", "the death of the author", "the endless sea",
    "the fragility of memory", "the heat death of the universe", "the weight of things",
    "humanity's lost innocence", "the tyranny of clutter", "the passage of time",
];

pub(crate) const CLOTHES: &[&str] = &[
    "ascot", "beret", "bolero", "caftan", "cape", "cardigan", "cravat", "fedora", "kimono",
    "mantle", "pinafore", "poncho", "sarong", "shawl", "tabard", "trench coat", "tunic",
    "waistcoat",
];

pub(crate) const SCIFI_WORDS: &[&str] = &[
    "atomic", "cosmic", "cybernetic", "galactic", "hyperspatial", "interstellar", "orbital",
    "positronic", "quantum", "radioactive", "robotic", "stellar",
];

pub(crate) const CHEESE_NAMES: &[&str] = &[
    "Abondance", "Banon", "Brillat", "Cantal", "Comtelle", "Epoisse", "Fontina", "Gabrielson",
    "Morbier", "Ossau", "Reblochon", "Tomme", "Vacherin", "Valencay",
];

pub(crate) const CHEESE_TEXTURES: &[&str] = &[
    "crumbly", "creamy", "dense and flaky", "firm", "oozing", "rubbery", "silky", "springy",
];

pub(crate) const CHEESE_FLAVORS: &[&str] = &[
    "nutty", "earthy", "of wet hay", "buttery", "sharp", "faintly of mushrooms", "tangy",
    "of brown butter and walnuts",
];

pub(crate) const CHEESE_COLORS: &[&str] = &[
    "pale ivory", "golden yellow", "deep amber", "stark white", "mottled orange",
    "straw-colored", "creamy white", "ash-grey",
];

pub(crate) const CHEESE_AGES: &[&str] = &[
    "young", "aged", "cave-aged", "cellar-ripened", "fresh", "well-aged", "briefly aged",
    "long-aged",
];

pub(crate) const FLAVORS: &[&str] = &[
    "black sesame", "blood orange", "butter pecan", "cardamom", "cherry", "coffee", "hazelnut",
    "honey lavender", "lemon", "licorice", "mango", "matcha", "mint", "pistachio", "rose",
    "salted caramel", "strawberry", "vanilla",
];

pub(crate) const ICE_CREAM_STYLES: &[&str] = &[
    "gelato", "ice cream", "frozen custard", "sherbet", "sorbet", "soft serve",
];

pub(crate) const CANDY_FORMS: &[&str] = &[
    "hard candy", "taffy", "lollipop", "gummy", "bonbon", "caramel chew", "toffee",
    "jawbreaker", "drop", "candy bar", "rock candy", "pastille", "nougat", "fudge", "truffle",
    "candy floss", "brittle", "praline", "dragee", "lozenge",
];
