pub struct Icons;

impl Icons {
    pub const CLIPBOARD: &str = "📋";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const STATS: &str = "📊";
    pub const QUESTION: &str = "❓";
    pub const ROBOT: &str = "🤖";
    pub const GOLD: &str = "🏅";
    pub const FILE: &str = "📄";
    pub const DATABASE: &str = "🗄️";
    pub const PERSON: &str = "👤";
    pub const EXPORT: &str = "📤";
    pub const STAR: &str = "⭐";
}
