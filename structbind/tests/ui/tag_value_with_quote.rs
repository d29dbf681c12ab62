use structbind::Bindable;

#[derive(Bindable)]
struct Config {
    #[bind(tags(config_default = "say \"hi\""))]
    greeting: String,
}

fn main() {}
