//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements        | Connects to                 |
//! |---------------|-------------------|-----------------------------|
//! | `hardware`    | GpioPort          | ESP32 GPIO outputs          |
//! |               | PwmProvider/Port  | ESP32 LEDC PWM              |
//! | `hal_gpio`    | GpioPort          | Any embedded-hal OutputPin  |
//! | `description` | DescriptionSource | JSON node / board defaults  |

pub mod description;
pub mod hal_gpio;
pub mod hardware;
