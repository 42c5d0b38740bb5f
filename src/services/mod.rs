// Supporting services
// Settings persistence shared by the GUI and RPC entry points.

pub mod settings_engine;
