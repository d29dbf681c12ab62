use structbind::Bindable;

#[derive(Bindable)]
struct Pair(u32, u32);

fn main() {}
