use structbind::Bindable;

#[derive(Bindable)]
struct Config {
    #[bind(rname = "Value")]
    value: String,
}

fn main() {}
