use structbind::Bindable;

#[derive(Bindable)]
enum Mode {
    Fast,
    Slow,
}

fn main() {}
