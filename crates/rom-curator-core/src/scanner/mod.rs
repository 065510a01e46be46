mod walk;

pub use walk::collect_items;
